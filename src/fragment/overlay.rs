//! CSS declarations copied onto a materialized fragment as XML attributes.

use std::sync::LazyLock;

use regex::Regex;

use super::MaterializedFragment;

/// Whole-name match only: `fill-opacity` or `-webkit-fill` are not overlaid.
static OVERLAY_PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(color|fill|height|stroke|stroke-width|width)$").unwrap()
});

/// Whether a CSS property is copied onto fragments.
#[inline]
pub fn is_overlay_property(prop: &str) -> bool {
    OVERLAY_PROPERTY.is_match(prop)
}

/// Attributes to set on a fragment, in sibling order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overlay(Vec<(String, String)>);

impl Overlay {
    /// Collect whitelisted declarations from `(property, value)` pairs.
    ///
    /// Values are taken verbatim. Duplicates are kept; the later one wins when
    /// applied.
    pub fn collect<'a, I>(declarations: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Self(
            declarations
                .into_iter()
                .filter(|(prop, _)| is_overlay_property(prop))
                .map(|(prop, value)| (prop.to_string(), value.to_string()))
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn apply(&self, fragment: &mut MaterializedFragment) {
        for (prop, value) in &self.0 {
            fragment.set_attr(prop.as_str(), value.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::materialize;
    use crate::svg::Element;

    fn fragment() -> MaterializedFragment {
        let mut g = Element::new("g");
        g.set_attr("id", "icon");
        g.set_attr("fill", "black");
        materialize(&g, Some("0 0 10 10"))
    }

    #[test]
    fn test_whitelist_exact_match() {
        for prop in ["color", "fill", "height", "stroke", "stroke-width", "width"] {
            assert!(is_overlay_property(prop), "{prop} should be overlaid");
        }
        for prop in [
            "fill-opacity",
            "stroke-opacity",
            "min-width",
            "Fill",
            "background-color",
            "stroke-widths",
            "",
        ] {
            assert!(!is_overlay_property(prop), "{prop} should not be overlaid");
        }
    }

    #[test]
    fn test_fill_opacity_is_not_applied() {
        let mut fragment = fragment();
        Overlay::collect([("fill-opacity", "0.5")]).apply(&mut fragment);
        assert_eq!(fragment.attr("fill"), Some("black"));
        assert!(fragment.attr("fill-opacity").is_none());
    }

    #[test]
    fn test_fill_is_applied() {
        let mut fragment = fragment();
        Overlay::collect([("fill", "red"), ("background", "none")]).apply(&mut fragment);
        assert_eq!(fragment.attr("fill"), Some("red"));
        assert!(fragment.attr("background").is_none());
    }

    #[test]
    fn test_last_duplicate_wins() {
        let mut fragment = fragment();
        let overlay = Overlay::collect([("width", "1em"), ("fill", "red"), ("width", "2em")]);
        assert_eq!(overlay.iter().count(), 3);
        overlay.apply(&mut fragment);
        assert_eq!(fragment.attr("width"), Some("2em"));
    }

    #[test]
    fn test_values_are_verbatim() {
        let mut fragment = fragment();
        Overlay::collect([("stroke-width", "calc(1px + 2%)"), ("color", "rgb(0 0 0 / 50%)")])
            .apply(&mut fragment);
        assert_eq!(fragment.attr("stroke-width"), Some("calc(1px + 2%)"));
        assert_eq!(fragment.attr("color"), Some("rgb(0 0 0 / 50%)"));
    }
}
