//! Resolved type definitions.
//!
//! A [`TypeDefinition`] is built once per `type` and `typedef` statement. Derived
//! types keep a pointer to the definition they restrict, so typedef chains stay
//! inspectable after resolution.

use std::fmt;
use std::sync::Arc;

use yangkit_core::{QName, QNameModule, YangVersion};

use super::constraints::{
    self, Bit, ConstraintError, EnumMember, MemberDecl, Pattern, RangeSet, decimal_bound,
};
use crate::path::PathExpression;

/// Namespace of the YANG built-in types.
pub const YANG_NAMESPACE: &str = "urn:ietf:params:xml:ns:yang:1";

macro_rules! builtins {
    ($($variant:ident => $text:literal,)*) => {
        /// The fixed set of YANG primitive types.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum BuiltinType {
            $($variant,)*
        }

        impl BuiltinType {
            pub const ALL: &'static [BuiltinType] = &[$(BuiltinType::$variant,)*];

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($text => Some(BuiltinType::$variant),)*
                    _ => None,
                }
            }

            pub fn as_str(self) -> &'static str {
                match self {
                    $(BuiltinType::$variant => $text,)*
                }
            }
        }
    };
}

builtins! {
    Binary => "binary",
    Bits => "bits",
    Boolean => "boolean",
    Decimal64 => "decimal64",
    Empty => "empty",
    Enumeration => "enumeration",
    Identityref => "identityref",
    InstanceIdentifier => "instance-identifier",
    Int8 => "int8",
    Int16 => "int16",
    Int32 => "int32",
    Int64 => "int64",
    Leafref => "leafref",
    String => "string",
    Union => "union",
    Uint8 => "uint8",
    Uint16 => "uint16",
    Uint32 => "uint32",
    Uint64 => "uint64",
}

impl BuiltinType {
    /// Value bounds of the integral types.
    pub fn integral_bounds(self) -> Option<(i128, i128)> {
        let bounds = match self {
            BuiltinType::Int8 => (i8::MIN.into(), i8::MAX.into()),
            BuiltinType::Int16 => (i16::MIN.into(), i16::MAX.into()),
            BuiltinType::Int32 => (i32::MIN.into(), i32::MAX.into()),
            BuiltinType::Int64 => (i64::MIN.into(), i64::MAX.into()),
            BuiltinType::Uint8 => (0, u8::MAX.into()),
            BuiltinType::Uint16 => (0, u16::MAX.into()),
            BuiltinType::Uint32 => (0, u32::MAX.into()),
            BuiltinType::Uint64 => (0, u64::MAX.into()),
            _ => return None,
        };
        Some(bounds)
    }

    pub fn is_integral(self) -> bool {
        self.integral_bounds().is_some()
    }

    pub fn qname(self) -> QName {
        QName::new(QNameModule::new(YANG_NAMESPACE, None), self.as_str())
            .expect("built-in type names are identifiers")
    }
}

impl fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Binary {
        length: RangeSet,
    },
    Bits {
        bits: Vec<Bit>,
    },
    Boolean,
    Decimal64 {
        /// Zero only on the unrestricted built-in, which cannot be used directly.
        fraction_digits: u8,
        range: RangeSet,
    },
    Empty,
    Enumeration {
        enums: Vec<EnumMember>,
    },
    Identityref {
        bases: Vec<QName>,
    },
    InstanceIdentifier {
        require_instance: bool,
    },
    Integral {
        range: RangeSet,
    },
    Leafref {
        path: Option<PathExpression>,
        require_instance: bool,
    },
    String {
        length: RangeSet,
        patterns: Vec<Pattern>,
    },
    Union {
        members: Vec<Arc<TypeDefinition>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    qname: QName,
    builtin: BuiltinType,
    base: Option<Arc<TypeDefinition>>,
    kind: TypeKind,
    default: Option<Arc<str>>,
    units: Option<Arc<str>>,
}

/// Restriction substatements of one `type` statement, already parsed.
#[derive(Debug, Clone, Default)]
pub struct Restrictions {
    pub length: Option<String>,
    pub range: Option<String>,
    pub patterns: Vec<Pattern>,
    pub fraction_digits: Option<u8>,
    pub bits: Vec<MemberDecl>,
    pub enums: Vec<MemberDecl>,
    pub bases: Vec<QName>,
    pub path: Option<PathExpression>,
    pub require_instance: Option<bool>,
    pub members: Vec<Arc<TypeDefinition>>,
}

impl TypeDefinition {
    /// The unrestricted built-in type.
    pub fn builtin(builtin: BuiltinType) -> Self {
        let full_length = || RangeSet::new(0, u64::MAX.into());
        let kind = match builtin {
            BuiltinType::Binary => TypeKind::Binary {
                length: full_length(),
            },
            BuiltinType::Bits => TypeKind::Bits { bits: Vec::new() },
            BuiltinType::Boolean => TypeKind::Boolean,
            BuiltinType::Decimal64 => TypeKind::Decimal64 {
                fraction_digits: 0,
                range: RangeSet::new(i64::MIN.into(), i64::MAX.into()),
            },
            BuiltinType::Empty => TypeKind::Empty,
            BuiltinType::Enumeration => TypeKind::Enumeration { enums: Vec::new() },
            BuiltinType::Identityref => TypeKind::Identityref { bases: Vec::new() },
            BuiltinType::InstanceIdentifier => TypeKind::InstanceIdentifier {
                require_instance: true,
            },
            BuiltinType::Leafref => TypeKind::Leafref {
                path: None,
                require_instance: true,
            },
            BuiltinType::String => TypeKind::String {
                length: full_length(),
                patterns: Vec::new(),
            },
            BuiltinType::Union => TypeKind::Union {
                members: Vec::new(),
            },
            integral => {
                let (min, max) = integral.integral_bounds().unwrap_or((0, 0));
                TypeKind::Integral {
                    range: RangeSet::new(min, max),
                }
            }
        };
        Self {
            qname: builtin.qname(),
            builtin,
            base: None,
            kind,
            default: None,
            units: None,
        }
    }

    pub fn qname(&self) -> &QName {
        &self.qname
    }

    pub fn builtin_type(&self) -> BuiltinType {
        self.builtin
    }

    /// The definition this one restricts. `None` for the built-ins themselves.
    pub fn base(&self) -> Option<&Arc<TypeDefinition>> {
        self.base.as_ref()
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Effective default, inherited along the typedef chain.
    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    pub fn is_builtin(&self) -> bool {
        self.base.is_none()
    }

    pub fn leafref_path(&self) -> Option<&PathExpression> {
        match &self.kind {
            TypeKind::Leafref { path, .. } => path.as_ref(),
            _ => None,
        }
    }

    /// Same definition under another name: a typedef wrapping its `type`, or a leaf
    /// carrying an inline type.
    pub fn renamed(
        self: &Arc<Self>,
        qname: QName,
        default: Option<Arc<str>>,
        units: Option<Arc<str>>,
    ) -> TypeDefinition {
        TypeDefinition {
            qname,
            builtin: self.builtin,
            base: Some(self.clone()),
            kind: self.kind.clone(),
            default: default.or_else(|| self.default.clone()),
            units: units.or_else(|| self.units.clone()),
        }
    }

    /// One-line description used by model dumps.
    pub fn describe(&self) -> String {
        let name = self.qname.local_name().to_string();
        match &self.kind {
            TypeKind::Integral { range } => {
                let (min, max) = self.builtin.integral_bounds().unwrap_or((0, 0));
                if *range == RangeSet::new(min, max) {
                    name
                } else {
                    format!("{name} {range}")
                }
            }
            TypeKind::Decimal64 {
                fraction_digits,
                range,
            } => format!(
                "{name}({fraction_digits}) {}",
                range.display_with(|v| decimal_bound(v, *fraction_digits))
            ),
            TypeKind::Binary { length } | TypeKind::String { length, .. }
                if *length != RangeSet::new(0, u64::MAX.into()) =>
            {
                format!("{name} length {length}")
            }
            TypeKind::Bits { bits } => {
                let members: Vec<String> = bits
                    .iter()
                    .map(|b| format!("{}={}", b.name, b.position))
                    .collect();
                format!("{name} {{{}}}", members.join(", "))
            }
            TypeKind::Enumeration { enums } => {
                let members: Vec<String> = enums
                    .iter()
                    .map(|e| format!("{}={}", e.name, e.value))
                    .collect();
                format!("{name} {{{}}}", members.join(", "))
            }
            TypeKind::Leafref {
                path: Some(path), ..
            } => format!("{name} {path}"),
            TypeKind::Identityref { bases } => {
                let bases: Vec<&str> = bases.iter().map(QName::local_name).collect();
                format!("{name} {}", bases.join(", "))
            }
            TypeKind::Union { members } => {
                let members: Vec<String> = members.iter().map(|m| m.describe()).collect();
                format!("{name} {{{}}}", members.join(" | "))
            }
            _ => name,
        }
    }
}

fn restriction(msg: String) -> ConstraintError {
    ConstraintError::Restriction(msg)
}

fn not_applicable(keyword: &str, base: &TypeDefinition) -> ConstraintError {
    restriction(format!(
        "`{keyword}` is not applicable to type {}",
        base.builtin
    ))
}

/// Build the definition of a `type` statement named `qname` that restricts `base`.
///
/// `base` is either [`TypeDefinition::builtin`] or a resolved typedef. Restrictions
/// not meaningful for the base kind are errors.
pub fn restrict(
    qname: QName,
    base: &Arc<TypeDefinition>,
    restrictions: Restrictions,
    version: YangVersion,
) -> Result<TypeDefinition, ConstraintError> {
    let Restrictions {
        length,
        range,
        patterns,
        fraction_digits,
        bits,
        enums,
        bases,
        path,
        require_instance,
        members,
    } = restrictions;

    let allows_length = matches!(base.kind, TypeKind::Binary { .. } | TypeKind::String { .. });
    let allows_range = matches!(
        base.kind,
        TypeKind::Integral { .. } | TypeKind::Decimal64 { .. }
    );
    if length.is_some() && !allows_length {
        return Err(not_applicable("length", base));
    }
    if range.is_some() && !allows_range {
        return Err(not_applicable("range", base));
    }
    if !patterns.is_empty() && !matches!(base.kind, TypeKind::String { .. }) {
        return Err(not_applicable("pattern", base));
    }
    if require_instance.is_some()
        && !matches!(
            base.kind,
            TypeKind::Leafref { .. } | TypeKind::InstanceIdentifier { .. }
        )
    {
        return Err(not_applicable("require-instance", base));
    }

    let kind = match &base.kind {
        TypeKind::Binary { length: base_length } => TypeKind::Binary {
            length: match &length {
                Some(text) => constraints::length(text, base_length)?,
                None => base_length.clone(),
            },
        },
        TypeKind::String {
            length: base_length,
            patterns: base_patterns,
        } => TypeKind::String {
            length: match &length {
                Some(text) => constraints::length(text, base_length)?,
                None => base_length.clone(),
            },
            patterns: base_patterns.iter().cloned().chain(patterns).collect(),
        },
        TypeKind::Boolean => TypeKind::Boolean,
        TypeKind::Empty => TypeKind::Empty,
        TypeKind::Integral { range: base_range } => TypeKind::Integral {
            range: match &range {
                Some(text) => constraints::integral_range(text, base_range)?,
                None => base_range.clone(),
            },
        },
        TypeKind::Decimal64 {
            fraction_digits: base_digits,
            range: base_range,
        } => {
            let digits = match (base.is_builtin(), fraction_digits) {
                (true, Some(digits)) => digits,
                (true, None) => {
                    return Err(restriction(
                        "decimal64 type requires fraction-digits".to_string(),
                    ));
                }
                (false, Some(digits)) if digits != *base_digits => {
                    return Err(restriction(format!(
                        "Cannot override fraction-digits from base type {} to {digits}",
                        base.qname
                    )));
                }
                (false, _) => *base_digits,
            };
            let base_range = if base.is_builtin() {
                RangeSet::new(i64::MIN.into(), i64::MAX.into())
            } else {
                base_range.clone()
            };
            TypeKind::Decimal64 {
                fraction_digits: digits,
                range: match &range {
                    Some(text) => constraints::decimal_range(text, &base_range, digits)?,
                    None => base_range,
                },
            }
        }
        TypeKind::Bits { bits: base_bits } => TypeKind::Bits {
            bits: if base.is_builtin() {
                constraints::number_bits(&bits)?
            } else if bits.is_empty() {
                base_bits.clone()
            } else if version == YangVersion::V1 {
                return Err(restriction(
                    "Restricted bits type is not allowed in YANG version 1".to_string(),
                ));
            } else {
                constraints::restrict_bits(&bits, base_bits, &base.qname)?
            },
        },
        TypeKind::Enumeration { enums: base_enums } => TypeKind::Enumeration {
            enums: if base.is_builtin() {
                constraints::number_enums(&enums)?
            } else if enums.is_empty() {
                base_enums.clone()
            } else if version == YangVersion::V1 {
                return Err(restriction(
                    "Restricted enumeration type is not allowed in YANG version 1".to_string(),
                ));
            } else {
                constraints::restrict_enums(&enums, base_enums, &base.qname)?
            },
        },
        TypeKind::Identityref { bases: base_bases } => TypeKind::Identityref {
            bases: if base.is_builtin() {
                bases
            } else {
                base_bases.clone()
            },
        },
        TypeKind::InstanceIdentifier {
            require_instance: inherited,
        } => TypeKind::InstanceIdentifier {
            require_instance: require_instance.unwrap_or(*inherited),
        },
        TypeKind::Leafref {
            path: base_path,
            require_instance: inherited,
        } => TypeKind::Leafref {
            path: if base.is_builtin() {
                path
            } else {
                base_path.clone()
            },
            require_instance: require_instance.unwrap_or(*inherited),
        },
        TypeKind::Union {
            members: base_members,
        } => TypeKind::Union {
            members: if base.is_builtin() {
                members
            } else {
                base_members.clone()
            },
        },
    };

    Ok(TypeDefinition {
        qname,
        builtin: base.builtin,
        base: Some(base.clone()),
        kind,
        default: base.default.clone(),
        units: base.units.clone(),
    })
}

