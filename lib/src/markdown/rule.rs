use std::borrow::Cow;

use crate::error::Result;
use crate::markdown::code::Fence;

/// Treats a line of exactly three dashes as a horizontal rule.
///
/// CommonMark reads `---` directly under a paragraph as a setext heading
/// underline. This plugin rewrites such lines, outside of fenced code, to
/// `***`, which is always a thematic break.
#[derive(Debug, Default, Copy, Clone)]
pub struct HorizontalRule;

impl crate::markdown::Plugin for HorizontalRule {
    fn preprocess<'a>(&self, input: &'a str) -> Result<Cow<'a, str>> {
        let mut fence = Fence::default();
        let mut output: Option<String> = None;
        let mut consumed = 0;

        for line in input.split_inclusive('\n') {
            let start = consumed;
            consumed += line.len();

            let content = line.trim_end_matches(['\n', '\r']);
            if !fence.is_code(content) && content.trim_end() == "---" {
                let output = output.get_or_insert_with(|| input[..start].to_string());
                output.push_str("***");
                output.push_str(&line[content.len()..]);
            } else if let Some(output) = output.as_mut() {
                output.push_str(line);
            }
        }

        Ok(output.map_or(Cow::Borrowed(input), Cow::Owned))
    }
}
