use std::borrow::Cow;

use crate::error::Result;

/// A text transform hooked around Markdown to HTML conversion.
pub trait Plugin {
    /// Rewrites the Markdown source before it is parsed.
    #[inline(always)]
    fn preprocess<'a>(&self, input: &'a str) -> Result<Cow<'a, str>> {
        Ok(Cow::Borrowed(input))
    }

    /// Rewrites the generated HTML.
    #[inline(always)]
    fn postprocess<'a>(&self, html: &'a str) -> Result<Cow<'a, str>> {
        Ok(Cow::Borrowed(html))
    }
}

impl<P: Plugin + ?Sized> Plugin for &P {
    fn preprocess<'a>(&self, input: &'a str) -> Result<Cow<'a, str>> {
        P::preprocess(self, input)
    }

    fn postprocess<'a>(&self, html: &'a str) -> Result<Cow<'a, str>> {
        P::postprocess(self, html)
    }
}
