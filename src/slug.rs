use std::sync::LazyLock;

use regex::Regex;

/// Used when a name has nothing left after canonicalization.
pub const PLACEHOLDER_SLUG: &str = "untitled";

static SEPARATOR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-z0-9]+").expect("separator pattern is valid"));

/// Derives a URL-safe slug from a display name.
///
/// The name is lowercased and every run of characters outside `[a-z0-9]`
/// becomes a single hyphen. Runs at either end of the name are dropped, so
/// the result never starts or ends with a hyphen and may be empty.
pub fn canonicalize(name: &str) -> String {
    let lowered = name.to_lowercase();
    SEPARATOR_RUN
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Like [`canonicalize`], but never returns an empty string.
pub fn canonicalize_or_placeholder(name: &str) -> String {
    let slug = canonicalize(name);
    if slug.is_empty() {
        PLACEHOLDER_SLUG.to_string()
    } else {
        slug
    }
}

/// Anything that can be addressed by a slug: a persisted one when present,
/// otherwise one derived from its name.
pub trait Sluggable {
    fn name(&self) -> &str;

    fn stored_slug(&self) -> Option<&str>;

    fn slug(&self) -> String {
        match self.stored_slug() {
            Some(slug) if !slug.trim().is_empty() => slug.to_string(),
            _ => canonicalize_or_placeholder(self.name()),
        }
    }
}

impl<T: Sluggable> Sluggable for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn stored_slug(&self) -> Option<&str> {
        (**self).stored_slug()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named {
        name: &'static str,
        slug: Option<&'static str>,
    }

    impl Sluggable for Named {
        fn name(&self) -> &str {
            self.name
        }

        fn stored_slug(&self) -> Option<&str> {
            self.slug
        }
    }

    #[test]
    fn test_canonicalize_mixed_name() {
        assert_eq!(canonicalize("GPT-4 Turbo!!"), "gpt-4-turbo");
        assert_eq!(canonicalize("Magic Writer"), "magic-writer");
        assert_eq!(canonicalize("  Leading and trailing  "), "leading-and-trailing");
    }

    #[test]
    fn test_canonicalize_collapses_separator_runs() {
        assert_eq!(canonicalize("a -- b__c"), "a-b-c");
        assert_eq!(canonicalize("Stable Diffusion XL 1.0"), "stable-diffusion-xl-1-0");
    }

    #[test]
    fn test_canonicalize_empty_and_symbols() {
        assert_eq!(canonicalize(""), "");
        assert_eq!(canonicalize("!!! ???"), "");
        assert_eq!(canonicalize_or_placeholder("!!!"), "untitled");
        assert_eq!(canonicalize_or_placeholder(""), "untitled");
    }

    #[test]
    fn test_canonicalize_drops_non_ascii_letters() {
        assert_eq!(canonicalize("Café Münch"), "caf-m-nch");
        assert_eq!(canonicalize("日本語 AI"), "ai");
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let inputs = [
            "gpt-4-turbo",
            "a--b",
            "-leading",
            "trailing-",
            "already-clean-123",
            "GPT-4 Turbo!!",
            "",
        ];
        for input in inputs {
            let once = canonicalize(input);
            assert_eq!(canonicalize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_sluggable_prefers_stored_slug() {
        let named = Named {
            name: "Quick Draft",
            slug: Some("quick-draft-app"),
        };
        assert_eq!(named.slug(), "quick-draft-app");
    }

    #[test]
    fn test_sluggable_falls_back_to_name() {
        let missing = Named {
            name: "Magic Writer",
            slug: None,
        };
        let blank = Named {
            name: "Magic Writer",
            slug: Some("  "),
        };
        let unnamed = Named {
            name: "???",
            slug: None,
        };
        assert_eq!(missing.slug(), "magic-writer");
        assert_eq!(blank.slug(), "magic-writer");
        assert_eq!(unnamed.slug(), "untitled");
    }
}
