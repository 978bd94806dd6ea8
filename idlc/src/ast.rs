//! Parsed IDL declarations, with their types already mapped to TypeScript.

use crate::registry::TsType;

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// A module, already emitted to its own output file.
    Module(Module),
    TypeAlias(TypeAlias),
    Struct(Struct),
    Exception(Struct),
    Enum(Enum),
    Interface(Interface),
    /// A comment passed through to the generated code.
    Comment(Comment),
    /// A name from another output file used by a later declaration.
    Import(Import),
}

impl Declaration {
    /// The declared name, if this is a declaration of a name.
    pub fn name(&self) -> Option<&str> {
        match self {
            Declaration::Module(module) => Some(&module.name),
            Declaration::TypeAlias(alias) => Some(&alias.name),
            Declaration::Struct(r#struct) | Declaration::Exception(r#struct) => {
                Some(&r#struct.name)
            }
            Declaration::Enum(r#enum) => Some(&r#enum.name),
            Declaration::Interface(interface) => Some(&interface.name),
            Declaration::Comment(_) | Declaration::Import(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: String,
    pub body: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAlias {
    pub name: String,
    pub r#type: TsType,
}

/// An entry in the body of a struct, enum or interface.
#[derive(Debug, Clone, PartialEq)]
pub enum Member<T> {
    Comment(Comment),
    Item(T),
}

impl<T> Member<T> {
    pub fn item(&self) -> Option<&T> {
        match self {
            Member::Item(item) => Some(item),
            Member::Comment(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Struct {
    pub name: String,
    pub members: Vec<Member<Field>>,
}

impl Struct {
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.members.iter().filter_map(Member::item)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub r#type: TsType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enum {
    pub name: String,
    pub members: Vec<Member<String>>,
}

impl Enum {
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.members.iter().filter_map(Member::item).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interface {
    pub name: String,
    pub members: Vec<Member<Method>>,
}

impl Interface {
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.members.iter().filter_map(Member::item)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub return_type: TsType,
    pub parameters: Vec<Parameter>,
    /// Exceptions listed in `raises(...)`, in source order.
    pub raises: Vec<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
    Inout,
}

impl Direction {
    /// `out` and `inout` parameters are passed in a mutable box.
    pub fn is_boxed(self) -> bool {
        !matches!(self, Direction::In)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub direction: Direction,
    pub name: String,
    pub r#type: TsType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// The whitespace between the previous token and the comment.
    pub leading: String,
    /// The comment text, including its `//` or `/* */` delimiters.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub name: String,
    /// The module specifier, relative to the importing file.
    pub from: String,
}
