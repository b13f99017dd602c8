//! Image URL recognition for text drops and pastes.

use once_cell::sync::Lazy;
use regex::Regex;

/// Image file extensions recognized by [`ExtensionImagePredicate::standard`].
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &[
    "apng", "avif", "bmp", "gif", "ico", "jfif", "jpeg", "jpg", "pjp", "pjpeg", "png", "svg",
    "tif", "tiff", "webp",
];

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z][A-Za-z0-9+.\-]*:)?//(?:[^\s.]+\.\S{2}|localhost[:?\d]*)\S*$")
        .expect("valid url regex")
});

/// Decides whether dropped or pasted text is an image URL.
pub trait ImageUrlPredicate {
    fn is_image_url(&self, text: &str) -> bool;
}

impl<F> ImageUrlPredicate for F
where
    F: Fn(&str) -> bool,
{
    fn is_image_url(&self, text: &str) -> bool {
        self(text)
    }
}

/// Well-formed URL whose path ends in a known image extension.
#[derive(Debug, Clone)]
pub struct ExtensionImagePredicate {
    extensions: Vec<String>,
}

impl Default for ExtensionImagePredicate {
    fn default() -> Self {
        Self::standard()
    }
}

impl ExtensionImagePredicate {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
        }
    }

    pub fn standard() -> Self {
        Self::new(DEFAULT_IMAGE_EXTENSIONS.iter().copied())
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }
}

impl ImageUrlPredicate for ExtensionImagePredicate {
    fn is_image_url(&self, text: &str) -> bool {
        if !is_url(text) {
            return false;
        }
        let path = text
            .split(['?', '#'])
            .next()
            .unwrap_or(text)
            .to_ascii_lowercase();
        let Some((_, ext)) = path.rsplit_once('.') else {
            return false;
        };
        self.extensions.iter().any(|known| known == ext)
    }
}

/// Syntactic URL check: scheme-relative or absolute, with a host.
pub fn is_url(text: &str) -> bool {
    URL_RE.is_match(text)
}
