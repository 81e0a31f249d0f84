//! Formatting settings
//!
//! One immutable value per request. Field names follow the `xml.format.*`
//! client settings, so the same struct deserializes from a TOML `[format]`
//! table and from a `workspace/didChangeConfiguration` payload.

use serde::{Deserialize, Deserializer, Serialize};

/// Preferred attribute value delimiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum QuoteStyle {
    #[default]
    DoubleQuotes,
    SingleQuotes,
}

impl QuoteStyle {
    pub fn as_char(self) -> char {
        match self {
            QuoteStyle::DoubleQuotes => '"',
            QuoteStyle::SingleQuotes => '\'',
        }
    }
}

/// Whether [`QuoteStyle`] is applied to existing values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum EnforceQuoteStyle {
    /// Keep each value's own delimiters
    #[default]
    Ignore,
    /// Rewrite delimiters to the preferred style
    Preferred,
}

/// Normalization of elements with no content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum EmptyElements {
    /// `<a/>` becomes `<a></a>`
    Expand,
    /// `<a></a>` becomes `<a/>`
    Collapse,
    #[default]
    Ignore,
}

/// Formatting options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormattingSettings {
    /// Columns per indent level when `insert_spaces` is set
    #[serde(deserialize_with = "non_negative")]
    pub tab_size: usize,
    pub insert_spaces: bool,
    /// Put every attribute on its own line
    pub split_attributes: bool,
    /// Indent levels of split attributes, relative to the element
    #[serde(deserialize_with = "non_negative")]
    pub split_attributes_indent_size: usize,
    /// Put `>`/`/>` on its own line after split attributes
    pub closing_bracket_new_line: bool,
    pub preserve_attribute_line_breaks: bool,
    pub quote_style: QuoteStyle,
    pub enforce_quote_style: EnforceQuoteStyle,
    pub space_before_empty_close_tag: bool,
    pub empty_elements: EmptyElements,
    /// Keep whitespace-only element bodies
    pub preserve_empty_content: bool,
    #[serde(rename = "joinCDATALines", alias = "joinCdataLines")]
    pub join_cdata_lines: bool,
    pub join_comment_lines: bool,
    pub join_content_lines: bool,
    pub format_comments: bool,
    /// Column budget for text wrapping, 0 disables wrapping
    #[serde(deserialize_with = "non_negative")]
    pub max_line_width: usize,
    /// Blank lines kept between siblings
    #[serde(deserialize_with = "non_negative")]
    pub preserved_newlines: usize,
    /// Element names whose content is never reformatted
    pub preserve_space: Vec<String>,
    /// Consult the content-model provider when classifying content
    pub grammar_aware_formatting: bool,
    pub trim_trailing_whitespace: bool,
    pub trim_final_newlines: bool,
    pub insert_final_newline: bool,
}

impl Default for FormattingSettings {
    fn default() -> Self {
        Self {
            tab_size: 2,
            insert_spaces: true,
            split_attributes: false,
            split_attributes_indent_size: 2,
            closing_bracket_new_line: false,
            preserve_attribute_line_breaks: true,
            quote_style: QuoteStyle::DoubleQuotes,
            enforce_quote_style: EnforceQuoteStyle::Ignore,
            space_before_empty_close_tag: true,
            empty_elements: EmptyElements::Ignore,
            preserve_empty_content: false,
            join_cdata_lines: false,
            join_comment_lines: false,
            join_content_lines: false,
            format_comments: true,
            max_line_width: 80,
            preserved_newlines: 2,
            preserve_space: default_preserve_space(),
            grammar_aware_formatting: true,
            trim_trailing_whitespace: false,
            trim_final_newlines: true,
            insert_final_newline: false,
        }
    }
}

impl FormattingSettings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Whitespace for `level` levels of indentation
    pub fn indent(&self, level: usize) -> String {
        if self.insert_spaces {
            " ".repeat(self.tab_size * level)
        } else {
            "\t".repeat(level)
        }
    }

    /// Quote preferred when rewriting delimiters, if rewriting is enabled
    pub fn enforced_quote(&self) -> Option<char> {
        match self.enforce_quote_style {
            EnforceQuoteStyle::Ignore => None,
            EnforceQuoteStyle::Preferred => Some(self.quote_style.as_char()),
        }
    }

    pub fn is_preserve_space(&self, name: &str) -> bool {
        self.preserve_space.iter().any(|candidate| candidate == name)
    }
}

fn default_preserve_space() -> Vec<String> {
    vec![
        "xsl:text".to_string(),
        "xsl:comment".to_string(),
        "xsl:processing-instruction".to_string(),
        "literallayout".to_string(),
        "programlisting".to_string(),
        "screen".to_string(),
        "synopsis".to_string(),
        "pre".to_string(),
        "xd:pre".to_string(),
    ]
}

/// Clients send `-1` for "unset"; anything negative means 0
fn non_negative<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = i64::deserialize(deserializer)?;
    Ok(usize::try_from(value.max(0)).unwrap_or(usize::MAX))
}
