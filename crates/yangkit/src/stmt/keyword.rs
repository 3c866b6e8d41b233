//! YANG statement keywords.

use std::fmt;

macro_rules! keywords {
    ($($variant:ident => $text:literal,)*) => {
        /// Every statement keyword defined by RFC 6020 and RFC 7950.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Keyword {
            $($variant,)*
        }

        impl Keyword {
            pub const ALL: &'static [Keyword] = &[$(Keyword::$variant,)*];

            pub fn lookup(text: &str) -> Option<Self> {
                match text {
                    $($text => Some(Keyword::$variant),)*
                    _ => None,
                }
            }

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Keyword::$variant => $text,)*
                }
            }
        }
    };
}

keywords! {
    Action => "action",
    Anydata => "anydata",
    Anyxml => "anyxml",
    Argument => "argument",
    Augment => "augment",
    Base => "base",
    BelongsTo => "belongs-to",
    Bit => "bit",
    Case => "case",
    Choice => "choice",
    Config => "config",
    Contact => "contact",
    Container => "container",
    Default => "default",
    Description => "description",
    Deviate => "deviate",
    Deviation => "deviation",
    Enum => "enum",
    ErrorAppTag => "error-app-tag",
    ErrorMessage => "error-message",
    Extension => "extension",
    Feature => "feature",
    FractionDigits => "fraction-digits",
    Grouping => "grouping",
    Identity => "identity",
    IfFeature => "if-feature",
    Import => "import",
    Include => "include",
    Input => "input",
    Key => "key",
    Leaf => "leaf",
    LeafList => "leaf-list",
    Length => "length",
    List => "list",
    Mandatory => "mandatory",
    MaxElements => "max-elements",
    MinElements => "min-elements",
    Modifier => "modifier",
    Module => "module",
    Must => "must",
    Namespace => "namespace",
    Notification => "notification",
    OrderedBy => "ordered-by",
    Organization => "organization",
    Output => "output",
    Path => "path",
    Pattern => "pattern",
    Position => "position",
    Prefix => "prefix",
    Presence => "presence",
    Range => "range",
    Reference => "reference",
    Refine => "refine",
    RequireInstance => "require-instance",
    Revision => "revision",
    RevisionDate => "revision-date",
    Rpc => "rpc",
    Status => "status",
    Submodule => "submodule",
    Type => "type",
    Typedef => "typedef",
    Unique => "unique",
    Units => "units",
    Uses => "uses",
    Value => "value",
    When => "when",
    YangVersion => "yang-version",
    YinElement => "yin-element",
}

impl Keyword {
    /// Nodes addressable through the schema tree namespace.
    pub fn is_schema_node(self) -> bool {
        matches!(
            self,
            Keyword::Container
                | Keyword::Leaf
                | Keyword::LeafList
                | Keyword::List
                | Keyword::Anydata
                | Keyword::Anyxml
                | Keyword::Choice
                | Keyword::Case
                | Keyword::Rpc
                | Keyword::Action
                | Keyword::Notification
                | Keyword::Input
                | Keyword::Output
        )
    }

    /// Nodes that appear in instance data. `choice` and `case` are schema-only.
    pub fn is_data_node(self) -> bool {
        matches!(
            self,
            Keyword::Container
                | Keyword::Leaf
                | Keyword::LeafList
                | Keyword::List
                | Keyword::Anydata
                | Keyword::Anyxml
                | Keyword::Input
                | Keyword::Output
        )
    }

    /// Statements whose data tree namespace can be descended into.
    pub fn is_data_tree_aware(self) -> bool {
        matches!(
            self,
            Keyword::Module
                | Keyword::Submodule
                | Keyword::Container
                | Keyword::List
                | Keyword::Choice
                | Keyword::Case
                | Keyword::Rpc
                | Keyword::Action
                | Keyword::Notification
                | Keyword::Input
                | Keyword::Output
                | Keyword::Augment
        )
    }

    /// Statements whose schema tree namespace can be descended into.
    pub fn is_schema_tree_aware(self) -> bool {
        self.is_data_tree_aware() || matches!(self, Keyword::Grouping)
    }

    /// Data definition statements that a `choice` accepts as a shorthand case.
    pub fn is_shorthand_case(self) -> bool {
        matches!(
            self,
            Keyword::Container
                | Keyword::Leaf
                | Keyword::LeafList
                | Keyword::List
                | Keyword::Anydata
                | Keyword::Anyxml
                | Keyword::Choice
        )
    }

    pub fn is_module(self) -> bool {
        matches!(self, Keyword::Module | Keyword::Submodule)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A statement keyword: either a YANG keyword or a `prefix:name` extension use.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StmtKeyword {
    Yang(Keyword),
    Extension { prefix: String, name: String },
}

impl StmtKeyword {
    pub fn yang(&self) -> Option<Keyword> {
        match self {
            StmtKeyword::Yang(kw) => Some(*kw),
            StmtKeyword::Extension { .. } => None,
        }
    }

    pub fn is(&self, keyword: Keyword) -> bool {
        self.yang() == Some(keyword)
    }
}

impl fmt::Display for StmtKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StmtKeyword::Yang(kw) => write!(f, "{kw}"),
            StmtKeyword::Extension { prefix, name } => write!(f, "{prefix}:{name}"),
        }
    }
}
