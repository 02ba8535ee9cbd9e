use core::{fmt, str::FromStr};

use crate::{ConfigError, Error, Result};

/// Width of the low word shared by serial and qualifier.
pub(crate) const WORD_BITS: u32 = 16;

/// Entity categories a SIQ can be qualified with.
///
/// Each category has a *tag*: its qualifier bit pattern prefixed by a
/// sentinel `1` bit, so the tag alone tells both the pattern and its width.
/// Leaves (terminal objects) have the low bit set; containers and records
/// have it clear.
///
/// | category | tag | compact pattern |
/// |---|---:|---|
/// | [`Content`](SiqType::Content) | 15 | `111` |
/// | [`OneToMany`](SiqType::OneToMany) | 11 | `011` |
/// | [`ManyToMany`](SiqType::ManyToMany) | 13 | `101` |
/// | [`Relationship`](SiqType::Relationship) | 9 | `001` |
/// | [`Tag`](SiqType::Tag) | 34 | `00010` |
/// | [`Channel`](SiqType::Channel) | 42 | `01010` |
/// | [`Thread`](SiqType::Thread) | 22 | `0110` |
/// | [`Message`](SiqType::Message) | 30 | `1110` |
/// | [`Account`](SiqType::Account) | 32 | `00000` |
/// | [`Group`](SiqType::Group) | 36 | `00100` |
/// | [`Event`](SiqType::Event) | 40 | `01000` |
/// | [`Invite`](SiqType::Invite) | 44 | `01100` |
/// | [`Application`](SiqType::Application) | 48 | `10000` |
/// | [`Collection`](SiqType::Collection) | 52 | `10100` |
/// | [`Product`](SiqType::Product) | 56 | `11000` |
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SiqType {
    // leaves
    /// Unstructured content such as binary data or strings.
    Content,
    /// Group member, array element.
    OneToMany,
    /// Many-to-many join, hash array element.
    ManyToMany,
    /// Relationship with three or more foreign keys.
    Relationship,
    // containers that may have children
    /// Tag for categorization or trending.
    Tag,
    /// Anything that holds messages.
    Channel,
    /// Thread, forum post, page.
    Thread,
    /// Single message, post or revision.
    Message,
    // records without children
    /// User account.
    Account,
    /// Group of users: member group, role.
    Group,
    /// Calendar event or task.
    Event,
    /// Invite or join request.
    Invite,
    /// Server side application or client.
    Application,
    /// User-created collection or curated feed.
    Collection,
    /// Anything sold for a fee: product or subscription.
    Product,
}

impl SiqType {
    /// Every category, leaves first.
    pub const ALL: [Self; 15] = [
        Self::Content,
        Self::OneToMany,
        Self::ManyToMany,
        Self::Relationship,
        Self::Tag,
        Self::Channel,
        Self::Thread,
        Self::Message,
        Self::Account,
        Self::Group,
        Self::Event,
        Self::Invite,
        Self::Application,
        Self::Collection,
        Self::Product,
    ];

    /// Sentinel-prefixed bit pattern.
    pub const fn tag(self) -> u8 {
        match self {
            Self::Content => 15,
            Self::OneToMany => 11,
            Self::ManyToMany => 13,
            Self::Relationship => 9,
            Self::Tag => 34,
            Self::Channel => 42,
            Self::Thread => 22,
            Self::Message => 30,
            Self::Account => 32,
            Self::Group => 36,
            Self::Event => 40,
            Self::Invite => 44,
            Self::Application => 48,
            Self::Collection => 52,
            Self::Product => 56,
        }
    }

    pub const fn from_tag(tag: u8) -> Option<Self> {
        let mut i = 0;
        while i < Self::ALL.len() {
            if Self::ALL[i].tag() == tag {
                return Some(Self::ALL[i]);
            }
            i += 1;
        }
        None
    }

    /// Width of the compact pattern: position of the sentinel bit.
    pub const fn compact_bits(self) -> u32 {
        u8::BITS - 1 - self.tag().leading_zeros()
    }

    /// The compact pattern with the sentinel bit removed.
    pub const fn compact_pattern(self) -> u8 {
        self.tag() & ((1 << self.compact_bits()) - 1)
    }

    pub const fn is_leaf(self) -> bool {
        self.tag() & 1 == 1
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::OneToMany => "one-to-many",
            Self::ManyToMany => "many-to-many",
            Self::Relationship => "relationship",
            Self::Tag => "tag",
            Self::Channel => "channel",
            Self::Thread => "thread",
            Self::Message => "message",
            Self::Account => "account",
            Self::Group => "group",
            Self::Event => "event",
            Self::Invite => "invite",
            Self::Application => "application",
            Self::Collection => "collection",
            Self::Product => "product",
        }
    }
}

impl fmt::Display for SiqType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parses either a category name (`"content"`) or its numeric tag (`"15"`).
impl FromStr for SiqType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let by_tag = s.parse::<u8>().ok().and_then(Self::from_tag);
        by_tag
            .or_else(|| {
                Self::ALL
                    .into_iter()
                    .find(|ty| ty.name().eq_ignore_ascii_case(s))
            })
            .ok_or_else(|| {
                ConfigError::InvalidValue {
                    key: "siq_type",
                    value: s.to_owned(),
                }
                .into()
            })
    }
}

/// How the 16-bit low word is split between serial and qualifier.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum QualifierProfile {
    /// Variable-width qualifier (3 to 5 bits), serial takes the rest (11 to
    /// 13 bits). Compatible with SIQs minted by other implementations.
    #[default]
    Compact,
    /// Fixed 6-bit qualifier holding the category tag, 10-bit serial.
    Wide,
}

impl QualifierProfile {
    const WIDE_BITS: u32 = 6;

    /// Qualifier for `ty` under this profile.
    pub const fn qualifier(self, ty: SiqType) -> Qualifier {
        match self {
            Self::Compact => Qualifier {
                value: ty.compact_pattern(),
                bits: ty.compact_bits() as u8,
            },
            Self::Wide => Qualifier {
                value: ty.tag(),
                bits: Self::WIDE_BITS as u8,
            },
        }
    }

    /// Width of the qualifier stored in `word`.
    ///
    /// Compact patterns form a suffix code, so the width is a function of
    /// the low bits alone: `…1` is 3 bits wide, `…110` is 4, everything else
    /// (`…010`, `…00`) is 5.
    pub const fn qualifier_bits(self, word: u16) -> u32 {
        match self {
            Self::Compact => {
                if word & 0b1 == 0b1 {
                    3
                } else if word & 0b111 == 0b110 {
                    4
                } else {
                    5
                }
            }
            Self::Wide => Self::WIDE_BITS,
        }
    }

    /// Splits a low word into its qualifier.
    pub const fn qualifier_of(self, word: u16) -> Qualifier {
        let bits = self.qualifier_bits(word);
        Qualifier {
            value: (word & ((1 << bits) - 1)) as u8,
            bits: bits as u8,
        }
    }

    /// Whether `qualifier` survives a pack and unpack under this profile,
    /// i.e. the width read back from its own bits is the width it claims.
    pub const fn fits(self, qualifier: Qualifier) -> bool {
        self.qualifier_bits(qualifier.value as u16) == qualifier.bits as u32
    }

    /// Resolves a qualifier back to its category, if it names one.
    pub const fn siq_type(self, qualifier: Qualifier) -> Option<SiqType> {
        match self {
            Self::Compact => {
                let mut i = 0;
                while i < SiqType::ALL.len() {
                    let ty = SiqType::ALL[i];
                    if ty.compact_bits() == qualifier.bits as u32
                        && ty.compact_pattern() == qualifier.value
                    {
                        return Some(ty);
                    }
                    i += 1;
                }
                None
            }
            Self::Wide => SiqType::from_tag(qualifier.value),
        }
    }
}

impl FromStr for QualifierProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "wide" => Ok(Self::Wide),
            _ => Err(ConfigError::InvalidValue {
                key: "qualifier_profile",
                value: s.to_owned(),
            }
            .into()),
        }
    }
}

/// The low-order qualifier bits of a SIQ.
///
/// Usually derived from a [`SiqType`] through a [`QualifierProfile`], but a
/// caller with its own schema may build one directly; the generator stores
/// it verbatim.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Qualifier {
    value: u8,
    bits: u8,
}

impl Qualifier {
    /// Largest qualifier width.
    pub const MAX_BITS: u32 = 6;

    /// Builds a raw qualifier of `bits` width.
    ///
    /// # Errors
    ///
    /// - [`Error::QualifierWidth`] if `bits` is not in `1..=6`
    /// - [`Error::FieldOverflow`] if `value` needs more than `bits` bits
    pub const fn new(value: u8, bits: u32) -> Result<Self> {
        if bits == 0 || bits > Self::MAX_BITS {
            return Err(Error::QualifierWidth { bits });
        }
        if value as u32 >= 1 << bits {
            return Err(Error::FieldOverflow {
                field: "qualifier",
                value: value as u128,
                bits,
            });
        }
        Ok(Self {
            value,
            bits: bits as u8,
        })
    }

    pub const fn value(self) -> u8 {
        self.value
    }

    pub const fn bits(self) -> u32 {
        self.bits as u32
    }

    /// Bits left for the serial next to this qualifier.
    pub const fn serial_bits(self) -> u32 {
        WORD_BITS - self.bits as u32
    }

    /// Largest serial that fits next to this qualifier.
    pub const fn max_serial(self) -> u16 {
        ((1_u32 << self.serial_bits()) - 1) as u16
    }

    pub const fn is_leaf(self) -> bool {
        self.value & 1 == 1
    }
}
