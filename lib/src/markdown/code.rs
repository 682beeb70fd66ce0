use std::borrow::Cow;

/// Tracks fenced code blocks, one line at a time.
#[derive(Debug, Default, Clone)]
pub struct Fence {
    open: Option<(u8, usize)>,
}

impl Fence {
    /// Feeds the next `line`, without its line ending. Returns `true` if the
    /// line is a fence or lies inside a fenced code block.
    pub fn is_code(&mut self, line: &str) -> bool {
        let was_open = self.open.is_some();
        let marker = fence_marker(line);
        if let Some(marker) = marker {
            self.open = match self.open {
                None => Some(marker),
                Some((c, n)) if marker.0 == c && marker.1 >= n && is_bare(line) => None,
                open => open,
            };
        }

        was_open || marker.is_some()
    }
}

/// The fence character and length if `line` opens or closes a code fence.
fn fence_marker(line: &str) -> Option<(u8, usize)> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }

    let c = *trimmed.as_bytes().first()?;
    if c != b'`' && c != b'~' {
        return None;
    }

    let n = trimmed.bytes().take_while(|&b| b == c).count();
    (n >= 3).then_some((c, n))
}

/// Closing fences carry no info string.
fn is_bare(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.bytes().all(|b| b == trimmed.as_bytes()[0])
}

/// Applies `f` to every stretch of `input` that is neither fenced code nor a
/// backtick code span. Code is copied through untouched.
///
/// ```rust
/// use std::borrow::Cow;
/// use trellis::markdown::code::replace_outside_code;
///
/// fn upper(s: &str) -> Cow<'_, str> {
///     Cow::Owned(s.to_uppercase())
/// }
///
/// let text = replace_outside_code("a `b` c\n```\nd\n```\ne\n", upper);
/// assert_eq!(text, "A `b` C\n```\nd\n```\nE\n");
/// ```
pub fn replace_outside_code<'a, F>(input: &'a str, f: F) -> Cow<'a, str>
    where F: for<'b> Fn(&'b str) -> Cow<'b, str>
{
    let mut rewriter = Rewriter { input, output: None, copied: 0 };
    let mut fence = Fence::default();
    let mut prose = 0;
    let mut consumed = 0;

    for line in input.split_inclusive('\n') {
        let start = consumed;
        consumed += line.len();

        let content = line.trim_end_matches(['\n', '\r']);
        if fence.is_code(content) || content.trim().is_empty() {
            rewriter.prose(prose, start, &f);
            prose = consumed;
        }
    }

    rewriter.prose(prose, input.len(), &f);
    rewriter.finish()
}

struct Rewriter<'a> {
    input: &'a str,
    output: Option<String>,
    copied: usize,
}

impl<'a> Rewriter<'a> {
    /// Rewrites `input[start..end]`, a single block of prose, skipping code
    /// spans.
    fn prose<F>(&mut self, start: usize, end: usize, f: &F)
        where F: for<'b> Fn(&'b str) -> Cow<'b, str>
    {
        let bytes = self.input.as_bytes();
        let mut segment = start;
        let mut i = start;
        while i < end {
            if bytes[i] != b'`' {
                i += 1;
                continue;
            }

            let run = backticks(&bytes[i..end]);
            match closing_run(&bytes[..end], i + run, run) {
                Some(close) => {
                    self.apply(segment, i, f);
                    segment = close;
                    i = close;
                }
                None => i += run,
            }
        }

        self.apply(segment, end, f);
    }

    fn apply<F>(&mut self, start: usize, end: usize, f: &F)
        where F: for<'b> Fn(&'b str) -> Cow<'b, str>
    {
        if start >= end {
            return;
        }

        if let Cow::Owned(text) = f(&self.input[start..end]) {
            let output = self.output.get_or_insert_with(String::new);
            output.push_str(&self.input[self.copied..start]);
            output.push_str(&text);
            self.copied = end;
        }
    }

    fn finish(self) -> Cow<'a, str> {
        match self.output {
            Some(mut output) => {
                output.push_str(&self.input[self.copied..]);
                Cow::Owned(output)
            }
            None => Cow::Borrowed(self.input),
        }
    }
}

fn backticks(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|&&b| b == b'`').count()
}

/// The end of the first run of exactly `run` backticks at or after `from`.
fn closing_run(bytes: &[u8], from: usize, run: usize) -> Option<usize> {
    let mut j = from;
    while j < bytes.len() {
        if bytes[j] != b'`' {
            j += 1;
            continue;
        }

        let n = backticks(&bytes[j..]);
        if n == run {
            return Some(j + n);
        }

        j += n;
    }

    None
}
