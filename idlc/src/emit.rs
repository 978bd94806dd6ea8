//! Rendering of declarations to TypeScript.
//!
//! Declarations are rendered into nested [`Fragment`]s, which are only joined
//! into a string once the body of a module or file is complete.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::ast::{
    Comment, Declaration, Enum, Interface, Member, Method, Parameter, Struct, TypeAlias,
};

const INDENT: &str = "    ";

/// A lazily concatenated piece of output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Leaf(String),
    Seq(Vec<Fragment>),
}

impl Fragment {
    pub fn new() -> Fragment {
        Fragment::Seq(Vec::new())
    }

    /// Append `fragment`, turning a leaf into a sequence if needed.
    pub fn push(&mut self, fragment: impl Into<Fragment>) {
        match self {
            Fragment::Seq(fragments) => fragments.push(fragment.into()),
            Fragment::Leaf(leaf) => {
                let leaf = Fragment::Leaf(std::mem::take(leaf));
                *self = Fragment::Seq(vec![leaf, fragment.into()]);
            }
        }
    }

    /// Join the leaves depth-first, left to right, without separators.
    pub fn flatten(&self) -> String {
        let mut output = String::new();
        self.flatten_into(&mut output);
        output
    }

    fn flatten_into(&self, output: &mut String) {
        match self {
            Fragment::Leaf(leaf) => output.push_str(leaf),
            Fragment::Seq(fragments) => {
                for fragment in fragments {
                    fragment.flatten_into(output);
                }
            }
        }
    }
}

impl Default for Fragment {
    fn default() -> Fragment {
        Fragment::new()
    }
}

impl From<&str> for Fragment {
    fn from(leaf: &str) -> Fragment {
        Fragment::Leaf(leaf.to_owned())
    }
}

impl From<String> for Fragment {
    fn from(leaf: String) -> Fragment {
        Fragment::Leaf(leaf)
    }
}

impl From<Vec<Fragment>> for Fragment {
    fn from(fragments: Vec<Fragment>) -> Fragment {
        Fragment::Seq(fragments)
    }
}

/// The generated contents of one output file. `None` means that the file
/// should not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub path: PathBuf,
    pub contents: Option<String>,
}

#[derive(Default)]
struct Target {
    /// Module specifier to imported names.
    imports: BTreeMap<String, BTreeSet<String>>,
    body: String,
}

/// Collects the rendered declarations of every output file in a session.
#[derive(Default)]
pub struct Emitter {
    targets: BTreeMap<PathBuf, Target>,
}

impl Emitter {
    pub fn new() -> Emitter {
        Emitter::default()
    }

    /// Render `body` into `target`. A target emitted more than once, eg. a
    /// reopened module, has the bodies appended in order.
    pub fn emit(&mut self, target: &Path, body: &[Declaration]) {
        let entry = self.targets.entry(target.to_path_buf()).or_default();
        for declaration in body {
            if let Declaration::Import(import) = declaration {
                entry
                    .imports
                    .entry(import.from.clone())
                    .or_default()
                    .insert(import.name.clone());
            }
        }
        entry.body.push_str(&declarations(body, 0).flatten());
    }

    pub fn finish(&mut self) -> Vec<Output> {
        std::mem::take(&mut self.targets)
            .into_iter()
            .map(|(path, target)| Output {
                contents: target.serialize(),
                path,
            })
            .collect()
    }
}

impl Target {
    fn serialize(&self) -> Option<String> {
        let body = self.body.trim_start_matches('\n');
        if body.is_empty() {
            return None;
        }

        let mut output = String::new();
        for (from, names) in &self.imports {
            output.push_str(&format!("import {{ {} }} from '{from}';\n", names.iter().join(", ")));
        }
        if !self.imports.is_empty() {
            output.push('\n');
        }
        output.push_str(body);
        output.push('\n');
        Some(output)
    }
}

fn newline(level: usize) -> Fragment {
    Fragment::Leaf(format!("\n{}", INDENT.repeat(level)))
}

/// Render the declarations of a module or file body.
pub fn declarations(body: &[Declaration], level: usize) -> Fragment {
    let mut output = Fragment::new();
    // Whether the last line rendered so far has no code on it.
    let mut line_start = true;
    for declaration in body {
        let fragment = match declaration {
            // Modules have their own output files.
            Declaration::Module(_) => {
                line_start = true;
                continue;
            }
            Declaration::Import(_) => continue,
            Declaration::Comment(comment) => self::comment(comment, level, line_start),
            Declaration::TypeAlias(alias) => type_alias(alias, level),
            Declaration::Struct(r#struct) => structure("export interface ", r#struct, "", level),
            Declaration::Exception(r#struct) => {
                structure("export class ", r#struct, " extends Error", level)
            }
            Declaration::Enum(r#enum) => enumeration(r#enum, level),
            Declaration::Interface(interface) => class(interface, level),
        };
        output.push(fragment);
        line_start = false;
    }
    output
}

/// Comments on their own line are re-indented, keeping blank lines before
/// them. Comments that trail other code keep their original spacing, unless
/// that code is not part of the output.
fn comment(comment: &Comment, level: usize, line_start: bool) -> Fragment {
    let newlines = comment.leading.matches('\n').count();
    if newlines == 0 && line_start {
        return Fragment::Seq(vec![newline(level), comment.text.as_str().into()]);
    }
    if newlines == 0 {
        return Fragment::Seq(vec![
            comment.leading.as_str().into(),
            comment.text.as_str().into(),
        ]);
    }
    Fragment::Seq(vec![
        "\n".repeat(newlines - 1).into(),
        newline(level),
        comment.text.as_str().into(),
    ])
}

fn type_alias(alias: &TypeAlias, level: usize) -> Fragment {
    Fragment::Seq(vec![
        newline(level),
        "export type ".into(),
        alias.name.as_str().into(),
        " = ".into(),
        alias.r#type.to_string().into(),
        ";".into(),
    ])
}

/// Render `{ ... }` around `members`, or `{}` if there are none.
fn block<T>(
    members: &[Member<T>],
    level: usize,
    mut item: impl FnMut(&T, usize) -> Fragment,
) -> Fragment {
    if members.is_empty() {
        return " {}".into();
    }

    let mut output = Fragment::from(" {");
    for member in members {
        match member {
            Member::Comment(comment) => output.push(self::comment(comment, level + 1, false)),
            Member::Item(member) => output.push(item(member, level + 1)),
        }
    }
    output.push(newline(level));
    output.push("}");
    output
}

fn structure(keyword: &str, r#struct: &Struct, extends: &str, level: usize) -> Fragment {
    Fragment::Seq(vec![
        newline(level),
        keyword.into(),
        r#struct.name.as_str().into(),
        extends.into(),
        block(&r#struct.members, level, |field, level| {
            Fragment::Seq(vec![
                newline(level),
                field.name.as_str().into(),
                ": ".into(),
                field.r#type.to_string().into(),
                ";".into(),
            ])
        }),
    ])
}

fn enumeration(r#enum: &Enum, level: usize) -> Fragment {
    Fragment::Seq(vec![
        newline(level),
        "export enum ".into(),
        r#enum.name.as_str().into(),
        block(&r#enum.members, level, |value, level| {
            Fragment::Seq(vec![newline(level), value.as_str().into(), ",".into()])
        }),
    ])
}

fn class(interface: &Interface, level: usize) -> Fragment {
    Fragment::Seq(vec![
        newline(level),
        "export abstract class ".into(),
        interface.name.as_str().into(),
        block(&interface.members, level, method),
    ])
}

fn method(method: &Method, level: usize) -> Fragment {
    let mut output = Fragment::new();
    for exception in &method.raises {
        output.push(newline(level));
        output.push(format!("/** @throws {{{exception}}} */"));
    }
    output.push(newline(level));
    output.push("abstract ");
    output.push(method.name.as_str());
    output.push("(");
    output.push(method.parameters.iter().map(parameter).join(", "));
    output.push("): ");
    output.push(method.return_type.to_string());
    output.push(";");
    output
}

fn parameter(parameter: &Parameter) -> String {
    if parameter.direction.is_boxed() {
        format!("{}: {{ value: {} }}", parameter.name, parameter.r#type)
    } else {
        format!("{}: {}", parameter.name, parameter.r#type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Direction, Field, Import};
    use crate::registry::TsType;

    #[test]
    fn flatten_is_a_depth_first_join() {
        let mut fragment = Fragment::from("a");
        fragment.push(Fragment::Seq(vec!["b".into(), Fragment::Seq(vec!["c".into()])]));
        fragment.push("d");
        assert_eq!(fragment.flatten(), "abcd");
        assert_eq!(Fragment::new().flatten(), "");
    }

    #[test]
    fn empty_targets_have_no_output() {
        let mut emitter = Emitter::new();
        emitter.emit(Path::new("M/m.ts"), &[]);
        assert_eq!(
            emitter.finish(),
            vec![Output {
                path: PathBuf::from("M/m.ts"),
                contents: None,
            }],
        );
    }

    #[test]
    fn struct_and_alias() {
        let body = vec![
            Declaration::Struct(Struct {
                name: "Point".to_owned(),
                members: vec![
                    Member::Item(Field {
                        name: "x".to_owned(),
                        r#type: TsType::Number,
                    }),
                    Member::Comment(Comment {
                        leading: " ".to_owned(),
                        text: "// metres".to_owned(),
                    }),
                    Member::Item(Field {
                        name: "label".to_owned(),
                        r#type: TsType::String,
                    }),
                ],
            }),
            Declaration::TypeAlias(TypeAlias {
                name: "Points".to_owned(),
                r#type: TsType::Array(Box::new(TsType::Named("Point".to_owned()))),
            }),
        ];

        let mut emitter = Emitter::new();
        emitter.emit(Path::new("geo.ts"), &body);
        let outputs = emitter.finish();
        assert_eq!(
            outputs[0].contents.as_deref(),
            Some(
                "export interface Point {\n    x: number; // metres\n    label: string;\n}\n\
                 export type Points = Array<Point>;\n"
            ),
        );
    }

    #[test]
    fn imports_are_hoisted_and_merged() {
        let import = |name: &str| {
            Declaration::Import(Import {
                name: name.to_owned(),
                from: "./Geo/geo".to_owned(),
            })
        };
        let alias = |name: &str, r#type: &str| {
            Declaration::TypeAlias(TypeAlias {
                name: name.to_owned(),
                r#type: TsType::Named(r#type.to_owned()),
            })
        };

        let mut emitter = Emitter::new();
        emitter.emit(
            Path::new("api.ts"),
            &[import("Point"), alias("Where", "Point")],
        );
        emitter.emit(
            Path::new("api.ts"),
            &[import("Shape"), import("Point"), alias("What", "Shape")],
        );
        assert_eq!(
            emitter.finish()[0].contents.as_deref(),
            Some(
                "import { Point, Shape } from './Geo/geo';\n\n\
                 export type Where = Point;\n\
                 export type What = Shape;\n"
            ),
        );
    }

    #[test]
    fn interface_methods() {
        let interface = Interface {
            name: "Account".to_owned(),
            members: vec![Member::Item(Method {
                name: "withdraw".to_owned(),
                return_type: TsType::Void,
                parameters: vec![
                    Parameter {
                        direction: Direction::In,
                        name: "amount".to_owned(),
                        r#type: TsType::Number,
                    },
                    Parameter {
                        direction: Direction::Out,
                        name: "balance".to_owned(),
                        r#type: TsType::Number,
                    },
                ],
                raises: vec!["Overdrawn".to_owned()],
            })],
        };

        assert_eq!(
            class(&interface, 0).flatten(),
            "\nexport abstract class Account {\
             \n    /** @throws {Overdrawn} */\
             \n    abstract withdraw(amount: number, balance: { value: number }): void;\
             \n}",
        );
    }

    #[test]
    fn trailing_comments_without_code_get_their_own_line() {
        let comment = |text: &str| {
            Declaration::Comment(Comment {
                leading: " ".to_owned(),
                text: text.to_owned(),
            })
        };
        let alias = Declaration::TypeAlias(TypeAlias {
            name: "Id".to_owned(),
            r#type: TsType::Number,
        });
        let module = Declaration::Module(crate::ast::Module {
            name: "Inner".to_owned(),
            body: Vec::new(),
        });

        let body = vec![comment("// first"), alias, comment("// id"), module, comment("// after")];
        assert_eq!(
            declarations(&body, 0).flatten(),
            "\n// first\nexport type Id = number; // id\n// after",
        );
    }

    #[test]
    fn empty_enum() {
        let r#enum = Enum {
            name: "Nothing".to_owned(),
            members: Vec::new(),
        };
        assert_eq!(enumeration(&r#enum, 0).flatten(), "\nexport enum Nothing {}");
    }
}
