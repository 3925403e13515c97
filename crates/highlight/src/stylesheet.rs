//! Style sheet text for the supported layouts.
//!
//! `custom_css` in the options replaces the generated text in both layouts.

use crate::options::HighlighterOptions;
use std::fmt::Write;

/// Classic layout: light rules plus `.res-nightmode` dark rules in one sheet.
pub fn classic_css(options: &HighlighterOptions) -> String {
    if let Some(custom) = &options.custom_css {
        log::debug!("using custom CSS");
        return custom.clone();
    }
    let class = &options.class_name;
    let target = format!(".comment.{class} > .entry .md");
    let mut css = String::new();

    let _ = write!(
        css,
        "{transition} {{\n  transition-property: padding, border, background-color, color;\n  transition-duration: {seconds}s;\n}}\n",
        transition = format!(".comment.{class}--transition > .entry .md"),
        seconds = options.transition_duration_seconds,
    );
    push_block(
        &mut css,
        &target,
        options,
        &options.background_color,
        &options.normal_text_color,
        CLASSIC_GEOMETRY,
    );
    if let Some(color) = &options.link_text_color {
        push_color(&mut css, &format!("{target} a"), color);
    }
    if let Some(color) = &options.quote_text_color {
        push_color(&mut css, &format!("{target} blockquote"), color);
    }

    let dark = format!(".res-nightmode {target}");
    push_block(
        &mut css,
        &dark,
        options,
        &options.background_color_dark,
        &options.normal_text_color_dark,
        CLASSIC_GEOMETRY,
    );
    if let Some(color) = &options.link_text_color_dark {
        push_color(&mut css, &format!("{dark} a"), color);
    }
    if let Some(color) = &options.quote_text_color_dark {
        push_color(&mut css, &format!("{dark} blockquote"), color);
    }
    css
}

/// Alternate layout: one palette, picked by the detected page mode.
///
/// Link and quote rules are emitted only when both the light and the dark
/// colour are configured.
pub fn alternate_css(options: &HighlighterOptions, dark_mode: bool) -> String {
    if let Some(custom) = &options.custom_css {
        log::debug!("using custom CSS");
        return custom.clone();
    }
    let class = &options.class_name;
    let target = format!(".Comment.{class} [data-test-id=\"comment\"]");
    let pick = |light: &str, dark: &str| if dark_mode { dark.to_string() } else { light.to_string() };
    let mut css = String::new();

    let _ = write!(
        css,
        "{transition} {{\n  transition-property: margin, padding, border, background-color, color;\n  transition-duration: {seconds}s;\n}}\n",
        transition = format!(".Comment.{class}--transition [data-test-id=\"comment\"]"),
        seconds = options.transition_duration_seconds,
    );
    push_block(
        &mut css,
        &target,
        options,
        &pick(&options.background_color, &options.background_color_dark),
        &pick(&options.normal_text_color, &options.normal_text_color_dark),
        ALTERNATE_GEOMETRY,
    );
    if let (Some(light), Some(dark)) = (&options.link_text_color, &options.link_text_color_dark) {
        push_color(&mut css, &format!("{target} a"), &pick(light, dark));
    }
    if let (Some(light), Some(dark)) = (&options.quote_text_color, &options.quote_text_color_dark) {
        push_color(&mut css, &format!("{target} blockquote"), &pick(light, dark));
    }
    css
}

/// Box geometry of a highlighted comment.
struct Geometry {
    padding: &'static str,
    radius: &'static str,
    margin_top: Option<&'static str>,
}

const CLASSIC_GEOMETRY: Geometry = Geometry {
    padding: "2px",
    radius: "2px",
    margin_top: None,
};

const ALTERNATE_GEOMETRY: Geometry = Geometry {
    padding: "4px 10px",
    radius: "4px",
    margin_top: Some("4px"),
};

fn push_block(
    css: &mut String,
    selector: &str,
    options: &HighlighterOptions,
    background: &str,
    color: &str,
    geometry: Geometry,
) {
    let _ = writeln!(css, "{selector} {{");
    if let Some(margin) = geometry.margin_top {
        let _ = writeln!(css, "  margin-top: {margin};");
    }
    let _ = write!(
        css,
        "  padding: {padding};\n  border: {border};\n  border-radius: {radius};\n  background-color: {background};\n  color: {color};\n}}\n",
        padding = geometry.padding,
        radius = geometry.radius,
        border = options.border_or_default(),
    );
}

fn push_color(css: &mut String, selector: &str, color: &str) {
    let _ = write!(css, "{selector} {{\n  color: {color};\n}}\n");
}
