//! Widget kinds and their typed, defaulted properties.
//!
//! The stored property bag is open-ended; this module is the typed view of
//! it. Each kind documents the keys it reads and the value used when a key
//! is missing or holds the wrong type. Defaults are applied when rendering,
//! never when loading.

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{FolioError, FolioResult};
use crate::geometry::Size;
use crate::properties::Properties;

/// The kind of widget a canvas item is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    /// A text label.
    Text,
    /// A pressable button, optionally linked to another page.
    Button,
    /// An image from the project's assets.
    Image,
    /// A plain filled box.
    Container,
    /// A filled box with elevation.
    Card,
    /// A text-entry field.
    Input,
}

impl WidgetKind {
    /// Every kind, in palette order.
    pub const ALL: [Self; 6] = [
        Self::Text,
        Self::Button,
        Self::Image,
        Self::Container,
        Self::Card,
        Self::Input,
    ];

    /// Stable wire tag.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Button => "button",
            Self::Image => "image",
            Self::Container => "container",
            Self::Card => "card",
            Self::Input => "input",
        }
    }

    /// Parse a wire tag.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::UnknownWidgetType`] for any tag not in [`Self::ALL`].
    pub fn from_tag(tag: &str) -> FolioResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag() == tag)
            .ok_or_else(|| FolioError::UnknownWidgetType(tag.to_string()))
    }

    /// Size given to a freshly added widget.
    #[must_use]
    pub const fn default_size(self) -> Size {
        match self {
            Self::Text => Size::new(200.0, 50.0),
            Self::Button => Size::new(150.0, 50.0),
            Self::Image => Size::new(200.0, 150.0),
            Self::Container => Size::new(200.0, 200.0),
            Self::Card => Size::new(250.0, 150.0),
            Self::Input => Size::new(250.0, 50.0),
        }
    }

    /// Property set given to a freshly added widget.
    #[must_use]
    pub fn default_properties(self) -> Properties {
        match self {
            Self::Text => {
                let d = TextProps::default();
                Properties::new()
                    .with("text", d.text)
                    .with("fontSize", d.font_size)
                    .with("isBold", d.is_bold)
                    .with("isItalic", d.is_italic)
                    .with("color", d.color)
            }
            Self::Button => {
                let d = ButtonProps::default();
                Properties::new()
                    .with("text", d.text)
                    .with("fontSize", d.font_size)
                    .with("backgroundColor", d.background_color)
                    .with("textColor", d.text_color)
                    .with("borderRadius", d.border_radius)
            }
            Self::Image => Properties::new()
                .with("imagePath", None::<String>)
                .with("borderRadius", ImageProps::default().border_radius),
            Self::Container | Self::Card => {
                let d = BoxProps::defaults_for(self);
                let props = Properties::new()
                    .with("backgroundColor", d.background_color)
                    .with("borderRadius", d.border_radius)
                    .with("text", "")
                    .with("textColor", d.text_color);
                if self == Self::Card {
                    props.with("elevation", d.elevation)
                } else {
                    props
                        .with("borderColor", None::<Color>)
                        .with("borderWidth", d.border_width)
                }
            }
            Self::Input => {
                let d = InputProps::default();
                Properties::new()
                    .with("hintText", d.hint_text)
                    .with("fontSize", d.font_size)
                    .with("textColor", d.text_color)
                    .with("borderColor", d.border_color)
                    .with("backgroundColor", d.background_color)
            }
        }
    }
}

impl std::fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Resolved properties of a `text` item.
#[derive(Debug, Clone, PartialEq)]
pub struct TextProps {
    /// `text`, default `"Text"`.
    pub text: String,
    /// `fontSize`, default 16.
    pub font_size: f64,
    /// `isBold`, default false.
    pub is_bold: bool,
    /// `isItalic`, default false.
    pub is_italic: bool,
    /// `color`, default opaque black.
    pub color: Color,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            text: "Text".to_string(),
            font_size: 16.0,
            is_bold: false,
            is_italic: false,
            color: Color::BLACK,
        }
    }
}

/// Resolved properties of a `button` item.
#[derive(Debug, Clone, PartialEq)]
pub struct ButtonProps {
    /// `text`, default `"Button"`.
    pub text: String,
    /// `fontSize`, default 16.
    pub font_size: f64,
    /// `backgroundColor`, default material blue.
    pub background_color: Color,
    /// `textColor`, default white.
    pub text_color: Color,
    /// `borderRadius`, default 8.
    pub border_radius: f64,
}

impl Default for ButtonProps {
    fn default() -> Self {
        Self {
            text: "Button".to_string(),
            font_size: 16.0,
            background_color: Color::from_packed(0xFF21_96F3),
            text_color: Color::WHITE,
            border_radius: 8.0,
        }
    }
}

/// Resolved properties of an `image` item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageProps {
    /// `imagePath`; empty strings count as absent.
    pub image_path: Option<String>,
    /// `borderRadius`, default 0.
    pub border_radius: f64,
}

/// Resolved properties of a `container` or `card` item.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxProps {
    /// `backgroundColor`; light grey for containers, white for cards.
    pub background_color: Color,
    /// `borderRadius`; 0 for containers, 12 for cards.
    pub border_radius: f64,
    /// `borderColor`, default none.
    pub border_color: Option<Color>,
    /// `borderWidth`, default 0.
    pub border_width: f64,
    /// `elevation`; 0 for containers, 4 for cards.
    pub elevation: f64,
    /// `text`, centered label; empty strings count as absent.
    pub label: Option<String>,
    /// `textColor`, default black.
    pub text_color: Color,
}

impl BoxProps {
    /// Defaults for `container` (and anything that is not a card) or `card`.
    #[must_use]
    pub fn defaults_for(kind: WidgetKind) -> Self {
        let is_card = kind == WidgetKind::Card;
        Self {
            background_color: if is_card {
                Color::WHITE
            } else {
                Color::from_packed(0xFFE0_E0E0)
            },
            border_radius: if is_card { 12.0 } else { 0.0 },
            border_color: None,
            border_width: 0.0,
            elevation: if is_card { 4.0 } else { 0.0 },
            label: None,
            text_color: Color::BLACK,
        }
    }
}

/// Resolved properties of an `input` item.
#[derive(Debug, Clone, PartialEq)]
pub struct InputProps {
    /// `hintText`, default `"Enter text..."`.
    pub hint_text: String,
    /// `fontSize`, default 16.
    pub font_size: f64,
    /// `textColor`, default black.
    pub text_color: Color,
    /// `borderColor`, default grey.
    pub border_color: Color,
    /// `backgroundColor`, default white.
    pub background_color: Color,
}

impl Default for InputProps {
    fn default() -> Self {
        Self {
            hint_text: "Enter text...".to_string(),
            font_size: 16.0,
            text_color: Color::BLACK,
            border_color: Color::from_packed(0xFF9E_9E9E),
            background_color: Color::WHITE,
        }
    }
}

/// Typed view of an item's properties with defaults filled in.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetProps {
    /// A `text` item.
    Text(TextProps),
    /// A `button` item.
    Button(ButtonProps),
    /// An `image` item.
    Image(ImageProps),
    /// A `container` item.
    Container(BoxProps),
    /// A `card` item.
    Card(BoxProps),
    /// An `input` item.
    Input(InputProps),
}

impl WidgetProps {
    /// Read the keys `kind` understands, falling back to its defaults.
    #[must_use]
    pub fn resolve(kind: WidgetKind, props: &Properties) -> Self {
        match kind {
            WidgetKind::Text => {
                let d = TextProps::default();
                Self::Text(TextProps {
                    text: props.get_str("text").map_or(d.text, str::to_string),
                    font_size: props.get_f64("fontSize").unwrap_or(d.font_size),
                    is_bold: props.get_bool("isBold").unwrap_or(d.is_bold),
                    is_italic: props.get_bool("isItalic").unwrap_or(d.is_italic),
                    color: props.get_color("color").unwrap_or(d.color),
                })
            }
            WidgetKind::Button => {
                let d = ButtonProps::default();
                Self::Button(ButtonProps {
                    text: props.get_str("text").map_or(d.text, str::to_string),
                    font_size: props.get_f64("fontSize").unwrap_or(d.font_size),
                    background_color: props
                        .get_color("backgroundColor")
                        .unwrap_or(d.background_color),
                    text_color: props.get_color("textColor").unwrap_or(d.text_color),
                    border_radius: props.get_f64("borderRadius").unwrap_or(d.border_radius),
                })
            }
            WidgetKind::Image => Self::Image(ImageProps {
                image_path: non_empty(props.get_str("imagePath")),
                border_radius: props.get_f64("borderRadius").unwrap_or_default(),
            }),
            WidgetKind::Container | WidgetKind::Card => {
                let d = BoxProps::defaults_for(kind);
                let resolved = BoxProps {
                    background_color: props
                        .get_color("backgroundColor")
                        .unwrap_or(d.background_color),
                    border_radius: props.get_f64("borderRadius").unwrap_or(d.border_radius),
                    border_color: props.get_color("borderColor"),
                    border_width: props.get_f64("borderWidth").unwrap_or(d.border_width),
                    elevation: props.get_f64("elevation").unwrap_or(d.elevation),
                    label: non_empty(props.get_str("text")),
                    text_color: props.get_color("textColor").unwrap_or(d.text_color),
                };
                if kind == WidgetKind::Card {
                    Self::Card(resolved)
                } else {
                    Self::Container(resolved)
                }
            }
            WidgetKind::Input => {
                let d = InputProps::default();
                Self::Input(InputProps {
                    hint_text: props.get_str("hintText").map_or(d.hint_text, str::to_string),
                    font_size: props.get_f64("fontSize").unwrap_or(d.font_size),
                    text_color: props.get_color("textColor").unwrap_or(d.text_color),
                    border_color: props.get_color("borderColor").unwrap_or(d.border_color),
                    background_color: props
                        .get_color("backgroundColor")
                        .unwrap_or(d.background_color),
                })
            }
        }
    }

    /// The kind this record was resolved for.
    #[must_use]
    pub const fn kind(&self) -> WidgetKind {
        match self {
            Self::Text(_) => WidgetKind::Text,
            Self::Button(_) => WidgetKind::Button,
            Self::Image(_) => WidgetKind::Image,
            Self::Container(_) => WidgetKind::Container,
            Self::Card(_) => WidgetKind::Card,
            Self::Input(_) => WidgetKind::Input,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip() {
        for kind in WidgetKind::ALL {
            assert_eq!(WidgetKind::from_tag(kind.tag()).expect("known tag"), kind);
        }
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        assert!(matches!(
            WidgetKind::from_tag("bogus"),
            Err(FolioError::UnknownWidgetType(tag)) if tag == "bogus"
        ));
        // Tags are case-sensitive.
        assert!(WidgetKind::from_tag("Text").is_err());
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let resolved = WidgetProps::resolve(WidgetKind::Text, &Properties::new());
        assert_eq!(resolved, WidgetProps::Text(TextProps::default()));
    }

    #[test]
    fn test_wrongly_typed_keys_fall_back() {
        let props = Properties::new()
            .with("fontSize", "huge")
            .with("isBold", 1)
            .with("text", "Hello");
        let WidgetProps::Text(text) = WidgetProps::resolve(WidgetKind::Text, &props) else {
            panic!("expected text props");
        };
        assert_eq!(text.text, "Hello");
        assert!((text.font_size - 16.0).abs() < f64::EPSILON);
        assert!(!text.is_bold);
    }

    #[test]
    fn test_defaults_resolve_to_themselves() {
        for kind in WidgetKind::ALL {
            let from_defaults = WidgetProps::resolve(kind, &kind.default_properties());
            let from_empty = WidgetProps::resolve(kind, &Properties::new());
            assert_eq!(from_defaults, from_empty, "{kind}");
        }
    }

    #[test]
    fn test_card_and_container_differ() {
        let WidgetProps::Card(card) = WidgetProps::resolve(WidgetKind::Card, &Properties::new())
        else {
            panic!("expected card");
        };
        assert!((card.elevation - 4.0).abs() < f64::EPSILON);
        assert_eq!(card.background_color, Color::WHITE);

        let WidgetProps::Container(container) =
            WidgetProps::resolve(WidgetKind::Container, &Properties::new())
        else {
            panic!("expected container");
        };
        assert!(container.elevation.abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_image_path_counts_as_absent() {
        let props = Properties::new().with("imagePath", "");
        let WidgetProps::Image(image) = WidgetProps::resolve(WidgetKind::Image, &props) else {
            panic!("expected image");
        };
        assert_eq!(image.image_path, None);
    }
}
