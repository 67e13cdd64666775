// Copyright 2025 the Skein Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed text attributes.
//!
//! An [`Attribute`] is one style or layout property. Attributes are grouped into
//! [`AttributeSet`]s, which chain to a parent set and resolve lookups last-wins, and
//! named sets can be registered in an [`AttributeCollection`] and referred to with
//! [`Attribute::Reference`].

mod collection;
mod set;

use alloc::sync::Arc;
use core::hash::{Hash, Hasher};

use peniko::Color;

pub use collection::{AttributeCollection, AttributeSetHandle};
pub use set::{AttributeSet, DEFAULT_FONT_SIZE, DEFAULT_INDENT_INCREMENT};

/// The discriminant of an [`Attribute`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// See [`Attribute::TextDirection`].
    TextDirection,
    /// See [`Attribute::Lang`].
    Lang,
    /// See [`Attribute::FontFamily`].
    FontFamily,
    /// See [`Attribute::FontSize`].
    FontSize,
    /// See [`Attribute::FontWeight`].
    FontWeight,
    /// See [`Attribute::FontStyle`].
    FontStyle,
    /// See [`Attribute::FontStretch`].
    FontStretch,
    /// See [`Attribute::FontFeature`].
    FontFeature,
    /// See [`Attribute::LetterSpacing`].
    LetterSpacing,
    /// See [`Attribute::WordSpacing`].
    WordSpacing,
    /// See [`Attribute::LineHeight`].
    LineHeight,
    /// See [`Attribute::TabStopIncrement`].
    TabStopIncrement,
    /// See [`Attribute::Fill`].
    Fill,
    /// See [`Attribute::Decoration`].
    Decoration,
    /// See [`Attribute::BaselineShift`].
    BaselineShift,
    /// See [`Attribute::ObjectAlign`].
    ObjectAlign,
    /// See [`Attribute::ObjectPadding`].
    ObjectPadding,
    /// See [`Attribute::HorizontalAlign`].
    HorizontalAlign,
    /// See [`Attribute::VerticalAlign`].
    VerticalAlign,
    /// See [`Attribute::VerticalTrim`].
    VerticalTrim,
    /// See [`Attribute::TextWrap`].
    TextWrap,
    /// See [`Attribute::TextOverflow`].
    TextOverflow,
    /// See [`Attribute::IndentLevel`].
    IndentLevel,
    /// See [`Attribute::IndentIncrement`].
    IndentIncrement,
    /// See [`Attribute::ListMarker`].
    ListMarker,
    /// See [`Attribute::ParagraphPadding`].
    ParagraphPadding,
    /// See [`Attribute::Reference`].
    Reference,
}

impl AttributeKind {
    /// The stable four byte tag of this kind.
    pub const fn tag(self) -> [u8; 4] {
        match self {
            Self::TextDirection => *b"tdir",
            Self::Lang => *b"lang",
            Self::FontFamily => *b"font",
            Self::FontSize => *b"fsiz",
            Self::FontWeight => *b"fwgt",
            Self::FontStyle => *b"fsty",
            Self::FontStretch => *b"fstr",
            Self::FontFeature => *b"feat",
            Self::LetterSpacing => *b"lspc",
            Self::WordSpacing => *b"wspc",
            Self::LineHeight => *b"lnhe",
            Self::TabStopIncrement => *b"tabs",
            Self::Fill => *b"fill",
            Self::Decoration => *b"deco",
            Self::BaselineShift => *b"bshf",
            Self::ObjectAlign => *b"oali",
            Self::ObjectPadding => *b"opad",
            Self::HorizontalAlign => *b"hali",
            Self::VerticalAlign => *b"vali",
            Self::VerticalTrim => *b"vtrm",
            Self::TextWrap => *b"wrap",
            Self::TextOverflow => *b"tovf",
            Self::IndentLevel => *b"ilvl",
            Self::IndentIncrement => *b"iinc",
            Self::ListMarker => *b"lmrk",
            Self::ParagraphPadding => *b"ppad",
            Self::Reference => *b"aref",
        }
    }

    /// Returns `true` for kinds where every occurrence contributes, rather than
    /// the last one overriding earlier ones.
    pub const fn is_cumulative(self) -> bool {
        matches!(self, Self::FontFeature | Self::Decoration)
    }
}

/// Base direction of text.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextDirection {
    /// Detect from the first strong character.
    #[default]
    Auto,
    /// Left to right.
    Ltr,
    /// Right to left.
    Rtl,
}

impl TextDirection {
    /// Returns `true` if the direction is right to left.
    pub fn is_rtl(self) -> bool {
        self == Self::Rtl
    }
}

/// A font family selector.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontFamily {
    /// Whatever the font collection considers its default family.
    #[default]
    Default,
    /// Generic sans serif family.
    SansSerif,
    /// Generic serif family.
    Serif,
    /// Generic monospace family.
    Monospace,
    /// Fonts for mathematical notation.
    Math,
    /// Color emoji.
    Emoji,
    /// A named family.
    Named(Arc<str>),
}

/// Visual weight class of a font, 1 to 1000.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FontWeight(pub u16);

impl FontWeight {
    /// Weight value of 100.
    pub const THIN: Self = Self(100);
    /// Weight value of 300.
    pub const LIGHT: Self = Self(300);
    /// Weight value of 400.
    pub const NORMAL: Self = Self(400);
    /// Weight value of 500.
    pub const MEDIUM: Self = Self(500);
    /// Weight value of 600.
    pub const SEMI_BOLD: Self = Self(600);
    /// Weight value of 700.
    pub const BOLD: Self = Self(700);
    /// Weight value of 900.
    pub const BLACK: Self = Self(900);
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// Visual style or slope of a font.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontStyle {
    /// An upright or "roman" style.
    #[default]
    Normal,
    /// Generally a slanted style, originally based on semi-cursive forms.
    Italic,
    /// A slanted version of the normal style.
    Oblique,
}

/// Visual width of a font, as a ratio of the normal width.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub struct FontStretch(pub f32);

impl FontStretch {
    /// Width that is 50% of normal.
    pub const ULTRA_CONDENSED: Self = Self(0.5);
    /// Width that is 75% of normal.
    pub const CONDENSED: Self = Self(0.75);
    /// Width that is 100% of normal.
    pub const NORMAL: Self = Self(1.0);
    /// Width that is 125% of normal.
    pub const EXPANDED: Self = Self(1.25);
    /// Width that is 200% of normal.
    pub const ULTRA_EXPANDED: Self = Self(2.0);
}

impl Default for FontStretch {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// An OpenType feature setting.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FontFeature {
    /// Feature tag, e.g. `*b"liga"`.
    pub tag: [u8; 4],
    /// Feature value, 0 disables.
    pub value: u32,
}

/// How the height of a line is computed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LineHeight {
    /// Use the font metrics (ascender + descender), scaled by `1.0`.
    Normal,
    /// A multiple of the font size.
    Relative(f32),
    /// A multiple of the font metrics line height.
    MetricsRelative(f32),
    /// A fixed line height in layout units.
    Absolute(f32),
}

impl Default for LineHeight {
    fn default() -> Self {
        Self::Normal
    }
}

/// Where a decoration line is drawn.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DecorationPosition {
    /// Below the baseline at the font's underline offset.
    #[default]
    Underline,
    /// At the bottom of the line, below descenders.
    Bottomline,
    /// Above the tallest ascender.
    Overline,
    /// Through the middle of lowercase letters.
    Throughline,
}

/// Stroke style of a decoration line.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DecorationStyle {
    /// A single solid line.
    #[default]
    Solid,
    /// Two solid lines.
    Double,
    /// A dotted line.
    Dotted,
    /// A dashed line.
    Dashed,
    /// A wavy line.
    Wavy,
}

/// A decoration line such as an underline.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Decoration {
    /// Where the line is placed.
    pub position: DecorationPosition,
    /// Stroke style.
    pub style: DecorationStyle,
    /// Line thickness, `0.0` derives it from the font size.
    pub thickness: f32,
    /// Extra offset along the y axis.
    pub offset: f32,
    /// Line color, `None` uses the text fill color.
    pub color: Option<Color>,
}

impl Decoration {
    /// A solid decoration at `position` using the text color.
    pub const fn new(position: DecorationPosition) -> Self {
        Self {
            position,
            style: DecorationStyle::Solid,
            thickness: 0.0,
            offset: 0.0,
            color: None,
        }
    }

    /// A solid underline using the text color.
    pub const fn underline() -> Self {
        Self::new(DecorationPosition::Underline)
    }

    /// A solid strike-through using the text color.
    pub const fn strikethrough() -> Self {
        Self::new(DecorationPosition::Throughline)
    }
}

/// Raises or lowers text relative to the baseline, scaling it down.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum BaselineShift {
    /// No shift.
    #[default]
    None,
    /// Superscript.
    Superscript,
    /// Subscript.
    Subscript,
}

impl BaselineShift {
    /// Font size scale applied by the shift.
    pub const fn scale(self) -> f32 {
        match self {
            Self::None => 1.0,
            Self::Superscript | Self::Subscript => 0.65,
        }
    }

    /// Baseline offset as a fraction of the unscaled font size; negative is up.
    pub const fn offset(self) -> f32 {
        match self {
            Self::None => 0.0,
            Self::Superscript => -0.35,
            Self::Subscript => 0.15,
        }
    }
}

/// Vertical placement of an inline object or icon relative to the surrounding text.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ObjectAlign {
    /// The bottom of the object sits on the baseline.
    #[default]
    Baseline,
    /// The object is centered on the middle of the text ascender.
    Center,
    /// The top of the object is aligned with the text ascender.
    Top,
    /// The bottom of the object is aligned with the text descender.
    Bottom,
}

/// Space around inline objects and icons.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ObjectPadding {
    /// Padding on the left and right.
    pub horizontal: f32,
    /// Padding above and below.
    pub vertical: f32,
}

/// Horizontal alignment of lines within the layout box.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum HorizontalAlign {
    /// Left for LTR paragraphs, right for RTL.
    #[default]
    Start,
    /// Right for LTR paragraphs, left for RTL.
    End,
    /// Always left.
    Left,
    /// Always right.
    Right,
    /// Centered.
    Center,
}

/// Vertical alignment of the line block within the layout box.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum VerticalAlign {
    /// Align to the top.
    #[default]
    Top,
    /// Center vertically.
    Center,
    /// Align to the bottom.
    Bottom,
}

/// Which part of the first and last line is used for vertical alignment.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum VerticalTrim {
    /// From the first line's ascender to the last line's descender.
    #[default]
    Default,
    /// From the first line's cap height to the last line's baseline.
    CapToBaseline,
}

/// Line wrapping mode.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextWrap {
    /// Only mandatory breaks start new lines.
    #[default]
    None,
    /// Wrap at word boundaries, overlong words overflow.
    Word,
    /// Wrap at word boundaries, breaking overlong words between graphemes.
    WordChar,
}

/// What happens to text that does not fit the layout box.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextOverflow {
    /// Content may exceed the box.
    #[default]
    None,
    /// Content is expected to scroll; same geometry as `None`.
    Scroll,
    /// Overflowing lines are excluded from the visible bounds.
    Clip,
    /// The last visible line is cut and ends with an ellipsis.
    Ellipsis,
}

/// Marker style of a list paragraph.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ListMarkerStyle {
    /// No marker.
    #[default]
    None,
    /// A fixed codepoint, e.g. a bullet.
    Codepoint(char),
    /// Decimal counter, `1.`.
    CounterDecimal,
    /// Lower case latin counter, `a.`.
    CounterLowerLatin,
    /// Upper case latin counter, `A.`.
    CounterUpperLatin,
}

/// List marker of a paragraph.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ListMarker {
    /// Marker style.
    pub style: ListMarkerStyle,
    /// Width reserved for the marker in front of the text.
    pub indent: f32,
    /// Space between the marker and the text.
    pub spacing: f32,
}

impl ListMarker {
    /// A bullet list marker.
    pub const fn bullet() -> Self {
        Self {
            style: ListMarkerStyle::Codepoint('\u{2022}'),
            indent: 32.0,
            spacing: 8.0,
        }
    }

    /// A decimal numbered list marker.
    pub const fn numbered() -> Self {
        Self {
            style: ListMarkerStyle::CounterDecimal,
            indent: 32.0,
            spacing: 8.0,
        }
    }
}

/// Vertical space around a paragraph, used by the editor when stacking paragraphs.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ParagraphPadding {
    /// Space above the paragraph.
    pub before: f32,
    /// Space below the paragraph.
    pub after: f32,
}

/// A single typed style or layout property.
#[derive(Clone, Debug, PartialEq)]
pub enum Attribute {
    /// Base direction of a paragraph.
    TextDirection(TextDirection),
    /// BCP 47 language tag.
    Lang(Arc<str>),
    /// Font family.
    FontFamily(FontFamily),
    /// Font size in layout units.
    FontSize(f32),
    /// Font weight.
    FontWeight(FontWeight),
    /// Font style.
    FontStyle(FontStyle),
    /// Font stretch.
    FontStretch(FontStretch),
    /// An OpenType feature. Cumulative.
    FontFeature(FontFeature),
    /// Extra space after each grapheme.
    LetterSpacing(f32),
    /// Extra space after each whitespace character.
    WordSpacing(f32),
    /// Line height.
    LineHeight(LineHeight),
    /// Distance between tab stops, `0.0` uses twice the font size.
    TabStopIncrement(f32),
    /// Text fill color.
    Fill(Color),
    /// A decoration line. Cumulative.
    Decoration(Decoration),
    /// Superscript or subscript.
    BaselineShift(BaselineShift),
    /// Vertical alignment of inline objects.
    ObjectAlign(ObjectAlign),
    /// Padding around inline objects.
    ObjectPadding(ObjectPadding),
    /// Horizontal alignment of lines.
    HorizontalAlign(HorizontalAlign),
    /// Vertical alignment of the text block.
    VerticalAlign(VerticalAlign),
    /// Vertical trim used for alignment.
    VerticalTrim(VerticalTrim),
    /// Line wrapping.
    TextWrap(TextWrap),
    /// Overflow handling.
    TextOverflow(TextOverflow),
    /// Indentation level of a paragraph.
    IndentLevel(u32),
    /// Width of one indentation level.
    IndentIncrement(f32),
    /// List marker of a paragraph.
    ListMarker(ListMarker),
    /// Space around a paragraph.
    ParagraphPadding(ParagraphPadding),
    /// Use the attributes of a named set from the attribute collection.
    Reference(AttributeSetHandle),
}

impl Attribute {
    /// The kind of this attribute.
    pub fn kind(&self) -> AttributeKind {
        match self {
            Self::TextDirection(_) => AttributeKind::TextDirection,
            Self::Lang(_) => AttributeKind::Lang,
            Self::FontFamily(_) => AttributeKind::FontFamily,
            Self::FontSize(_) => AttributeKind::FontSize,
            Self::FontWeight(_) => AttributeKind::FontWeight,
            Self::FontStyle(_) => AttributeKind::FontStyle,
            Self::FontStretch(_) => AttributeKind::FontStretch,
            Self::FontFeature(_) => AttributeKind::FontFeature,
            Self::LetterSpacing(_) => AttributeKind::LetterSpacing,
            Self::WordSpacing(_) => AttributeKind::WordSpacing,
            Self::LineHeight(_) => AttributeKind::LineHeight,
            Self::TabStopIncrement(_) => AttributeKind::TabStopIncrement,
            Self::Fill(_) => AttributeKind::Fill,
            Self::Decoration(_) => AttributeKind::Decoration,
            Self::BaselineShift(_) => AttributeKind::BaselineShift,
            Self::ObjectAlign(_) => AttributeKind::ObjectAlign,
            Self::ObjectPadding(_) => AttributeKind::ObjectPadding,
            Self::HorizontalAlign(_) => AttributeKind::HorizontalAlign,
            Self::VerticalAlign(_) => AttributeKind::VerticalAlign,
            Self::VerticalTrim(_) => AttributeKind::VerticalTrim,
            Self::TextWrap(_) => AttributeKind::TextWrap,
            Self::TextOverflow(_) => AttributeKind::TextOverflow,
            Self::IndentLevel(_) => AttributeKind::IndentLevel,
            Self::IndentIncrement(_) => AttributeKind::IndentIncrement,
            Self::ListMarker(_) => AttributeKind::ListMarker,
            Self::ParagraphPadding(_) => AttributeKind::ParagraphPadding,
            Self::Reference(_) => AttributeKind::Reference,
        }
    }

    /// The four byte tag of this attribute's kind.
    pub fn tag(&self) -> [u8; 4] {
        self.kind().tag()
    }

    /// The value used when no attribute of `kind` is present.
    ///
    /// Returns `None` for kinds without a default: language, list marker, the
    /// cumulative kinds and references.
    pub fn default_for(kind: AttributeKind) -> Option<Self> {
        Some(match kind {
            AttributeKind::TextDirection => Self::TextDirection(TextDirection::Auto),
            AttributeKind::FontFamily => Self::FontFamily(FontFamily::Default),
            AttributeKind::FontSize => Self::FontSize(set::DEFAULT_FONT_SIZE),
            AttributeKind::FontWeight => Self::FontWeight(FontWeight::NORMAL),
            AttributeKind::FontStyle => Self::FontStyle(FontStyle::Normal),
            AttributeKind::FontStretch => Self::FontStretch(FontStretch::NORMAL),
            AttributeKind::LetterSpacing => Self::LetterSpacing(0.0),
            AttributeKind::WordSpacing => Self::WordSpacing(0.0),
            AttributeKind::LineHeight => Self::LineHeight(LineHeight::Normal),
            AttributeKind::TabStopIncrement => Self::TabStopIncrement(0.0),
            AttributeKind::Fill => Self::Fill(Color::BLACK),
            AttributeKind::BaselineShift => Self::BaselineShift(BaselineShift::None),
            AttributeKind::ObjectAlign => Self::ObjectAlign(ObjectAlign::Baseline),
            AttributeKind::ObjectPadding => Self::ObjectPadding(ObjectPadding::default()),
            AttributeKind::HorizontalAlign => Self::HorizontalAlign(HorizontalAlign::Start),
            AttributeKind::VerticalAlign => Self::VerticalAlign(VerticalAlign::Top),
            AttributeKind::VerticalTrim => Self::VerticalTrim(VerticalTrim::Default),
            AttributeKind::TextWrap => Self::TextWrap(TextWrap::None),
            AttributeKind::TextOverflow => Self::TextOverflow(TextOverflow::None),
            AttributeKind::IndentLevel => Self::IndentLevel(0),
            AttributeKind::IndentIncrement => {
                Self::IndentIncrement(set::DEFAULT_INDENT_INCREMENT)
            }
            AttributeKind::ParagraphPadding => {
                Self::ParagraphPadding(ParagraphPadding::default())
            }
            AttributeKind::Lang
            | AttributeKind::FontFeature
            | AttributeKind::Decoration
            | AttributeKind::ListMarker
            | AttributeKind::Reference => return None,
        })
    }

    /// Bold font weight.
    pub const fn bold() -> Self {
        Self::FontWeight(FontWeight::BOLD)
    }

    /// Italic font style.
    pub const fn italic() -> Self {
        Self::FontStyle(FontStyle::Italic)
    }

    /// Solid underline in the text color.
    pub const fn underline() -> Self {
        Self::Decoration(Decoration::underline())
    }

    /// Solid strike-through in the text color.
    pub const fn strikethrough() -> Self {
        Self::Decoration(Decoration::strikethrough())
    }
}

fn hash_f32<H: Hasher>(value: f32, state: &mut H) {
    value.to_bits().hash(state);
}

fn hash_color<H: Hasher>(color: Color, state: &mut H) {
    let rgba = color.to_rgba8();
    [rgba.r, rgba.g, rgba.b, rgba.a].hash(state);
}

impl Hash for Attribute {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            Self::TextDirection(v) => v.hash(state),
            Self::Lang(v) => v.hash(state),
            Self::FontFamily(v) => v.hash(state),
            Self::FontWeight(v) => v.hash(state),
            Self::FontStyle(v) => v.hash(state),
            Self::FontFeature(v) => v.hash(state),
            Self::BaselineShift(v) => v.hash(state),
            Self::ObjectAlign(v) => v.hash(state),
            Self::HorizontalAlign(v) => v.hash(state),
            Self::VerticalAlign(v) => v.hash(state),
            Self::VerticalTrim(v) => v.hash(state),
            Self::TextWrap(v) => v.hash(state),
            Self::TextOverflow(v) => v.hash(state),
            Self::IndentLevel(v) => v.hash(state),
            Self::Reference(v) => v.hash(state),
            Self::FontStretch(FontStretch(v))
            | Self::FontSize(v)
            | Self::LetterSpacing(v)
            | Self::WordSpacing(v)
            | Self::TabStopIncrement(v)
            | Self::IndentIncrement(v) => hash_f32(*v, state),
            Self::LineHeight(v) => match v {
                LineHeight::Normal => 0_u8.hash(state),
                LineHeight::Relative(x) => {
                    1_u8.hash(state);
                    hash_f32(*x, state);
                }
                LineHeight::MetricsRelative(x) => {
                    2_u8.hash(state);
                    hash_f32(*x, state);
                }
                LineHeight::Absolute(x) => {
                    3_u8.hash(state);
                    hash_f32(*x, state);
                }
            },
            Self::Fill(c) => hash_color(*c, state),
            Self::Decoration(d) => {
                d.position.hash(state);
                d.style.hash(state);
                hash_f32(d.thickness, state);
                hash_f32(d.offset, state);
                if let Some(c) = d.color {
                    hash_color(c, state);
                }
            }
            Self::ObjectPadding(p) => {
                hash_f32(p.horizontal, state);
                hash_f32(p.vertical, state);
            }
            Self::ListMarker(m) => {
                m.style.hash(state);
                hash_f32(m.indent, state);
                hash_f32(m.spacing, state);
            }
            Self::ParagraphPadding(p) => {
                hash_f32(p.before, state);
                hash_f32(p.after, state);
            }
        }
    }
}
