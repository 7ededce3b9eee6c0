//! Wrapper types making it harder to accidentally use the wrong underlying type.

use std::{
    borrow::Cow,
    fmt::{self, Display},
    str::FromStr,
};

use crate::math::Vector3;

/// Side length of a chunk column and height of one chunk section, in blocks.
pub const SECTION_SIZE: i32 = 16;

/// A numeric dimension id as handed out by the host registry.
///
/// `0` is the overworld and doubles as the "no dimension" sentinel; it is never
/// handed out for a dynamically created dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct DimensionId(pub i32);

impl DimensionId {
    /// The overworld, also used as "no id".
    pub const OVERWORLD: Self = Self(0);

    /// Returns true for the reserved sentinel id.
    #[must_use]
    pub const fn is_reserved(self) -> bool {
        self.0 == Self::OVERWORLD.0
    }

    /// Returns true if this id may be assigned to a dynamic dimension.
    #[must_use]
    pub const fn is_assignable(self) -> bool {
        self.0 > 0
    }
}

impl Display for DimensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for DimensionId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// A chunk column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPos {
    /// Chunk x coordinate.
    pub x: i32,
    /// Chunk z coordinate.
    pub z: i32,
}

impl ChunkPos {
    /// Creates a chunk position from chunk coordinates.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The chunk column containing a world position.
    #[must_use]
    pub fn containing(pos: Vector3<f64>) -> Self {
        Self::new(block_to_section(pos.x), block_to_section(pos.z))
    }

    /// Packs both coordinates into one `i64`.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        (self.x as i64 & 0xFFFF_FFFF) | ((self.z as i64 & 0xFFFF_FFFF) << 32)
    }
}

/// Converts a world coordinate to the index of the chunk or section holding it.
#[must_use]
pub fn block_to_section(coord: f64) -> i32 {
    (coord / f64::from(SECTION_SIZE)).floor() as i32
}

/// A namespaced identifier such as `minecraft:plains`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier {
    /// The namespace, `minecraft` for vanilla content.
    pub namespace: Cow<'static, str>,
    /// The path inside the namespace.
    pub path: Cow<'static, str>,
}

impl Identifier {
    /// The vanilla namespace.
    pub const VANILLA_NAMESPACE: &'static str = "minecraft";

    /// Creates an identifier in the vanilla namespace.
    #[must_use]
    pub fn vanilla(path: String) -> Self {
        Identifier {
            namespace: Cow::Borrowed(Self::VANILLA_NAMESPACE),
            path: Cow::Owned(path),
        }
    }

    /// Creates a vanilla identifier from static text.
    #[must_use]
    pub const fn vanilla_static(path: &'static str) -> Self {
        Identifier {
            namespace: Cow::Borrowed(Self::VANILLA_NAMESPACE),
            path: Cow::Borrowed(path),
        }
    }

    fn valid_namespace_char(namespace_char: char) -> bool {
        namespace_char == '_'
            || namespace_char == '-'
            || namespace_char.is_ascii_lowercase()
            || namespace_char.is_ascii_digit()
            || namespace_char == '.'
    }

    fn valid_path_char(path_char: char) -> bool {
        Self::valid_namespace_char(path_char) || path_char == '/'
    }

    /// Checks the characters of a namespace.
    #[must_use]
    pub fn validate_namespace(namespace: &str) -> bool {
        !namespace.is_empty() && namespace.chars().all(Self::valid_namespace_char)
    }

    /// Checks the characters of a path.
    #[must_use]
    pub fn validate_path(path: &str) -> bool {
        !path.is_empty() && path.chars().all(Self::valid_path_char)
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for Identifier {
    type Err = String;

    /// Parses `namespace:path`; a bare path lands in the vanilla namespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, path) = s.split_once(':').unwrap_or((Self::VANILLA_NAMESPACE, s));

        if !Identifier::validate_namespace(namespace) {
            return Err(format!("Invalid namespace: {namespace}"));
        }

        if !Identifier::validate_path(path) {
            return Err(format!("Invalid path: {path}"));
        }

        Ok(Identifier {
            namespace: Cow::Owned(namespace.to_string()),
            path: Cow::Owned(path.to_string()),
        })
    }
}
