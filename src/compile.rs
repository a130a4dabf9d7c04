//! Derive JSON Schema (draft-07) from TypeScript type declarations
//!
//! Only the declarative subset of TypeScript that describes data is understood:
//! `interface` (with `extends`), `type` aliases and `enum`s, built from primitive
//! keywords, literals, arrays, tuples, object literals, `Record<string, T>`, unions
//! and intersections. JSDoc blocks become `description`s.

use serde_json::{json, Map, Number, Value};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// `--type` value selecting every declaration
pub const ALL_TYPES: &str = "*";

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("unsupported source '{0}': only TypeScript (.ts) declarations can be compiled")]
    UnsupportedSource(PathBuf),

    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("reference to unknown type '{0}'")]
    UnknownType(String),

    #[error("no declaration named '{0}' in the source file")]
    TypeNotFound(String),

    #[error("'{name}' cannot extend '{base}': only object types can be extended")]
    UnsupportedExtends { name: String, base: String },

    #[error("type alias cycle {0}: an alias cannot resolve to itself")]
    CircularAlias(String),
}

fn syntax(line: usize, message: impl Into<String>) -> CompileError {
    CompileError::Syntax {
        line,
        message: message.into(),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Str(String),
    Num(f64),
    Punct(char),
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    line: usize,
    /// JSDoc block immediately preceding the token
    doc: Option<String>,
}

fn tokenize(src: &str) -> Result<Vec<Token>, CompileError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut pending_doc = None;
    let mut line = 1;
    let mut i = 0;

    let push = |tokens: &mut Vec<Token>, tok, line, doc: &mut Option<String>| {
        tokens.push(Token {
            tok,
            line,
            doc: doc.take(),
        })
    };

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            '\n' => {
                line += 1;
                i += 1;
            }
            c if c.is_whitespace() => i += 1,
            '/' if next == Some('/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if next == Some('*') => {
                let start_line = line;
                let is_doc = chars.get(i + 2) == Some(&'*') && chars.get(i + 3) != Some(&'/');
                let body_start = i + 2;
                let mut j = body_start;
                while j + 1 < chars.len() && !(chars[j] == '*' && chars[j + 1] == '/') {
                    if chars[j] == '\n' {
                        line += 1;
                    }
                    j += 1;
                }
                if j + 1 >= chars.len() {
                    return Err(syntax(start_line, "unterminated comment"));
                }
                if is_doc {
                    let body: String = chars[body_start + 1..j].iter().collect();
                    pending_doc = clean_doc(&body);
                }
                i = j + 2;
            }
            '"' | '\'' | '`' => {
                let quote = c;
                let mut text = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None | Some('\n') => return Err(syntax(line, "unterminated string literal")),
                        Some('\\') => {
                            let escaped = chars.get(i + 1).copied().unwrap_or('\\');
                            text.push(match escaped {
                                'n' => '\n',
                                't' => '\t',
                                'r' => '\r',
                                other => other,
                            });
                            i += 2;
                        }
                        Some(&ch) if ch == quote => {
                            i += 1;
                            break;
                        }
                        Some(&ch) => {
                            text.push(ch);
                            i += 1;
                        }
                    }
                }
                push(&mut tokens, Tok::Str(text), line, &mut pending_doc);
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.' || chars[i] == '_') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().filter(|c| **c != '_').collect();
                let n: f64 = text
                    .parse()
                    .ok()
                    .filter(|n: &f64| n.is_finite())
                    .ok_or_else(|| syntax(line, format!("invalid number '{text}'")))?;
                push(&mut tokens, Tok::Num(n), line, &mut pending_doc);
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                push(&mut tokens, Tok::Ident(text), line, &mut pending_doc);
            }
            '{' | '}' | '[' | ']' | '(' | ')' | '<' | '>' | ':' | ';' | ',' | '|' | '&' | '?' | '=' | '.' | '-' => {
                push(&mut tokens, Tok::Punct(c), line, &mut pending_doc);
                i += 1;
            }
            other => return Err(syntax(line, format!("unexpected character '{other}'"))),
        }
    }
    Ok(tokens)
}

/// Text of a JSDoc block without the leading asterisks and `@tag` lines
fn clean_doc(body: &str) -> Option<String> {
    let lines: Vec<&str> = body
        .lines()
        .map(|l| l.trim().trim_start_matches('*').trim())
        .take_while(|l| !l.starts_with('@'))
        .collect();
    let text = lines.join("\n").trim().to_string();
    (!text.is_empty()).then_some(text)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    String,
    Number,
    Boolean,
    Null,
    Undefined,
    Any,
    Object,
}

impl Keyword {
    fn from_ident(s: &str) -> Option<Self> {
        Some(match s {
            "string" => Keyword::String,
            "number" | "bigint" => Keyword::Number,
            "boolean" => Keyword::Boolean,
            "null" => Keyword::Null,
            "undefined" | "void" => Keyword::Undefined,
            "any" | "unknown" => Keyword::Any,
            "object" => Keyword::Object,
            _ => return None,
        })
    }

    fn json_type(self) -> Option<&'static str> {
        match self {
            Keyword::String => Some("string"),
            Keyword::Number => Some("number"),
            Keyword::Boolean => Some("boolean"),
            Keyword::Null => Some("null"),
            Keyword::Object => Some("object"),
            Keyword::Undefined | Keyword::Any => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TsType {
    Keyword(Keyword),
    Literal(Value),
    Array(Box<TsType>),
    Tuple(Vec<TsType>),
    Object(ObjectType),
    Record(Box<TsType>),
    Union(Vec<TsType>),
    Intersection(Vec<TsType>),
    Ref(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
struct ObjectType {
    members: Vec<Member>,
    /// Value type of an index signature, `[key: string]: T`
    index: Option<Box<TsType>>,
}

#[derive(Debug, Clone, PartialEq)]
struct Member {
    name: String,
    optional: bool,
    ty: TsType,
    doc: Option<String>,
}

#[derive(Debug, Clone)]
enum DeclKind {
    Interface { extends: Vec<String>, body: ObjectType },
    Alias(TsType),
    Enum(Vec<Value>),
}

#[derive(Debug, Clone)]
struct Decl {
    name: String,
    doc: Option<String>,
    kind: DeclKind,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos).map(|t| &t.tok)
    }

    fn peek_nth(&self, n: usize) -> Option<&Tok> {
        self.tokens.get(self.pos + n).map(|t| &t.tok)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn doc(&self) -> Option<String> {
        self.tokens.get(self.pos).and_then(|t| t.doc.clone())
    }

    fn bump(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.pos).map(|t| t.tok.clone());
        self.pos += 1;
        tok
    }

    fn is_punct(&self, c: char) -> bool {
        self.peek() == Some(&Tok::Punct(c))
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.is_punct(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, c: char) -> Result<(), CompileError> {
        if self.eat_punct(c) {
            Ok(())
        } else {
            Err(syntax(self.line(), format!("expected '{c}'")))
        }
    }

    fn is_ident(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Tok::Ident(s)) if s == word)
    }

    fn eat_ident(&mut self, word: &str) -> bool {
        if self.is_ident(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_ident(&mut self) -> Result<String, CompileError> {
        let line = self.line();
        match self.bump() {
            Some(Tok::Ident(s)) => Ok(s),
            _ => Err(syntax(line, "expected an identifier")),
        }
    }

    fn parse_program(&mut self) -> Result<Vec<Decl>, CompileError> {
        let mut decls = Vec::new();
        while self.peek().is_some() {
            let doc = self.doc();
            let line = self.line();
            self.eat_ident("export");
            self.eat_ident("declare");

            if self.eat_ident("interface") {
                let name = self.expect_ident()?;
                self.reject_type_parameters(&name)?;
                let mut extends = Vec::new();
                if self.eat_ident("extends") {
                    loop {
                        extends.push(self.expect_ident()?);
                        if !self.eat_punct(',') {
                            break;
                        }
                    }
                }
                self.expect_punct('{')?;
                let body = self.parse_object_body()?;
                decls.push(Decl {
                    name,
                    doc,
                    kind: DeclKind::Interface { extends, body },
                });
            } else if self.eat_ident("type") {
                let name = self.expect_ident()?;
                self.reject_type_parameters(&name)?;
                self.expect_punct('=')?;
                let ty = self.parse_type()?;
                decls.push(Decl {
                    name,
                    doc,
                    kind: DeclKind::Alias(ty),
                });
            } else if self.is_ident("enum") || self.is_ident("const") {
                self.eat_ident("const");
                if !self.eat_ident("enum") {
                    return Err(syntax(line, "expected 'enum'"));
                }
                let name = self.expect_ident()?;
                let values = self.parse_enum_body()?;
                decls.push(Decl {
                    name,
                    doc,
                    kind: DeclKind::Enum(values),
                });
            } else if self.eat_ident("import") {
                while self.peek().is_some() && !self.eat_punct(';') {
                    self.pos += 1;
                }
                continue;
            } else {
                return Err(syntax(line, "expected an interface, type or enum declaration"));
            }
            self.eat_punct(';');
        }
        Ok(decls)
    }

    fn reject_type_parameters(&self, name: &str) -> Result<(), CompileError> {
        if self.is_punct('<') {
            return Err(syntax(self.line(), format!("generic declaration '{name}' is not supported")));
        }
        Ok(())
    }

    /// Members up to and including the closing brace
    fn parse_object_body(&mut self) -> Result<ObjectType, CompileError> {
        let mut obj = ObjectType::default();
        loop {
            let doc = self.doc();
            if self.eat_punct('}') {
                break;
            }
            if self.is_ident("readonly")
                && !matches!(self.peek_nth(1), Some(Tok::Punct(':' | '?' | ';' | ',' | '}')))
            {
                self.pos += 1;
            }

            if self.eat_punct('[') {
                self.expect_ident()?;
                self.expect_punct(':')?;
                self.parse_type()?;
                self.expect_punct(']')?;
                self.expect_punct(':')?;
                obj.index = Some(Box::new(self.parse_type()?));
            } else {
                let line = self.line();
                let name = match self.bump() {
                    Some(Tok::Ident(s)) | Some(Tok::Str(s)) => s,
                    Some(Tok::Num(n)) => number(n).to_string(),
                    _ => return Err(syntax(line, "expected a property name or '}'")),
                };
                let optional = self.eat_punct('?');
                if self.is_punct('(') || self.is_punct('<') {
                    return Err(syntax(line, format!("method signature '{name}' is not supported")));
                }
                self.expect_punct(':')?;
                let ty = self.parse_type()?;
                obj.members.push(Member {
                    name,
                    optional,
                    ty,
                    doc,
                });
            }
            if !self.eat_punct(';') {
                self.eat_punct(',');
            }
        }
        Ok(obj)
    }

    fn parse_enum_body(&mut self) -> Result<Vec<Value>, CompileError> {
        self.expect_punct('{')?;
        let mut values = Vec::new();
        let mut counter = 0.0;
        while !self.eat_punct('}') {
            let line = self.line();
            match self.bump() {
                Some(Tok::Ident(_)) | Some(Tok::Str(_)) => {}
                _ => return Err(syntax(line, "expected an enum member")),
            }
            if self.eat_punct('=') {
                let negative = self.eat_punct('-');
                let line = self.line();
                match self.bump() {
                    Some(Tok::Str(s)) if !negative => values.push(Value::String(s)),
                    Some(Tok::Num(n)) => {
                        let n = if negative { -n } else { n };
                        values.push(number(n));
                        counter = n + 1.0;
                    }
                    _ => return Err(syntax(line, "enum initializers must be string or number literals")),
                }
            } else {
                values.push(number(counter));
                counter += 1.0;
            }
            if !self.eat_punct(',') {
                self.expect_punct('}')?;
                break;
            }
        }
        Ok(values)
    }

    fn parse_type(&mut self) -> Result<TsType, CompileError> {
        self.eat_punct('|');
        let mut alts = vec![self.parse_intersection()?];
        while self.eat_punct('|') {
            alts.push(self.parse_intersection()?);
        }
        Ok(if alts.len() == 1 {
            alts.remove(0)
        } else {
            TsType::Union(alts)
        })
    }

    fn parse_intersection(&mut self) -> Result<TsType, CompileError> {
        self.eat_punct('&');
        let mut parts = vec![self.parse_postfix()?];
        while self.eat_punct('&') {
            parts.push(self.parse_postfix()?);
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            TsType::Intersection(parts)
        })
    }

    fn parse_postfix(&mut self) -> Result<TsType, CompileError> {
        let mut ty = self.parse_primary()?;
        while self.is_punct('[') && self.peek_nth(1) == Some(&Tok::Punct(']')) {
            self.pos += 2;
            ty = TsType::Array(Box::new(ty));
        }
        Ok(ty)
    }

    fn parse_primary(&mut self) -> Result<TsType, CompileError> {
        let line = self.line();
        match self.bump() {
            Some(Tok::Punct('(')) => {
                let ty = self.parse_type()?;
                self.expect_punct(')')?;
                Ok(ty)
            }
            Some(Tok::Punct('{')) => Ok(TsType::Object(self.parse_object_body()?)),
            Some(Tok::Punct('[')) => {
                let mut items = Vec::new();
                while !self.eat_punct(']') {
                    items.push(self.parse_type()?);
                    if !self.eat_punct(',') {
                        self.expect_punct(']')?;
                        break;
                    }
                }
                Ok(TsType::Tuple(items))
            }
            Some(Tok::Punct('-')) => match self.bump() {
                Some(Tok::Num(n)) => Ok(TsType::Literal(number(-n))),
                _ => Err(syntax(line, "expected a number after '-'")),
            },
            Some(Tok::Str(s)) => Ok(TsType::Literal(Value::String(s))),
            Some(Tok::Num(n)) => Ok(TsType::Literal(number(n))),
            Some(Tok::Ident(name)) => self.parse_named(name, line),
            _ => Err(syntax(line, "expected a type")),
        }
    }

    fn parse_named(&mut self, name: String, line: usize) -> Result<TsType, CompileError> {
        match name.as_str() {
            "true" => return Ok(TsType::Literal(Value::Bool(true))),
            "false" => return Ok(TsType::Literal(Value::Bool(false))),
            _ => {}
        }
        if let Some(kw) = Keyword::from_ident(&name) {
            return Ok(TsType::Keyword(kw));
        }
        if self.eat_punct('<') {
            let ty = match name.as_str() {
                "Array" | "ReadonlyArray" => TsType::Array(Box::new(self.parse_type()?)),
                "Record" => {
                    self.parse_type()?;
                    self.expect_punct(',')?;
                    TsType::Record(Box::new(self.parse_type()?))
                }
                other => return Err(syntax(line, format!("generic type '{other}' is not supported"))),
            };
            self.expect_punct('>')?;
            return Ok(ty);
        }
        if self.is_punct('.') {
            return Err(syntax(line, format!("qualified name '{name}.…' is not supported")));
        }
        Ok(TsType::Ref(name))
    }
}

fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

fn json_type_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn type_keyword(mut types: Vec<&'static str>) -> Value {
    let mut seen = BTreeSet::new();
    types.retain(|t| seen.insert(*t));
    if types.len() == 1 {
        json!(types[0])
    } else {
        json!(types)
    }
}

struct Emitter<'a> {
    decls: HashMap<&'a str, &'a Decl>,
    /// Names referenced while emitting, still to be defined
    pending: VecDeque<String>,
}

impl<'a> Emitter<'a> {
    fn definition(&mut self, decl: &Decl) -> Result<Value, CompileError> {
        let mut schema = match &decl.kind {
            DeclKind::Interface { .. } => {
                let obj = self.resolve_object(&decl.name, &mut Vec::new())?;
                self.emit_object(&obj)?
            }
            DeclKind::Alias(ty) => {
                self.check_alias_cycle(&decl.name, ty, &mut vec![decl.name.clone()])?;
                self.emit(ty)?
            }
            DeclKind::Enum(values) => json!({
                "type": type_keyword(values.iter().map(json_type_of).collect()),
                "enum": values,
            }),
        };
        if let (Some(doc), Value::Object(map)) = (&decl.doc, &mut schema) {
            map.insert("description".into(), json!(doc));
        }
        Ok(schema)
    }

    /// Members of an interface with the members of its bases merged in
    fn resolve_object(&self, name: &str, visiting: &mut Vec<String>) -> Result<ObjectType, CompileError> {
        let decl = self
            .decls
            .get(name)
            .ok_or_else(|| CompileError::UnknownType(name.to_string()))?;
        if visiting.iter().any(|v| v == name) {
            return Err(CompileError::UnsupportedExtends {
                name: name.to_string(),
                base: visiting.join(" -> "),
            });
        }
        visiting.push(name.to_string());

        let result = match &decl.kind {
            DeclKind::Interface { extends, body } => {
                let mut merged = ObjectType::default();
                for base in extends {
                    let base_obj = self.resolve_object(base, visiting).map_err(|e| match e {
                        CompileError::UnknownType(_) | CompileError::UnsupportedExtends { .. } => {
                            CompileError::UnsupportedExtends {
                                name: name.to_string(),
                                base: base.clone(),
                            }
                        }
                        other => other,
                    })?;
                    merge_members(&mut merged, base_obj);
                }
                merge_members(&mut merged, body.clone());
                merged
            }
            DeclKind::Alias(TsType::Object(obj)) => obj.clone(),
            _ => {
                return Err(CompileError::UnsupportedExtends {
                    name: visiting.first().cloned().unwrap_or_default(),
                    base: name.to_string(),
                })
            }
        };
        visiting.pop();
        Ok(result)
    }

    /// Fail when `ty` reaches `start` again through aliases alone
    ///
    /// A reference nested in an object, array or tuple is fine; one standing bare in
    /// the alias (or in one of its unions or intersections) would make the schema
    /// refer to itself without consuming any input.
    fn check_alias_cycle(&self, start: &str, ty: &TsType, path: &mut Vec<String>) -> Result<(), CompileError> {
        for name in bare_refs(ty) {
            if name == start {
                path.push(name.to_string());
                return Err(CompileError::CircularAlias(path.join(" -> ")));
            }
            if path.iter().any(|p| p == name) {
                continue;
            }
            if let Some(Decl {
                kind: DeclKind::Alias(next),
                ..
            }) = self.decls.get(name).copied()
            {
                path.push(name.to_string());
                self.check_alias_cycle(start, next, path)?;
                path.pop();
            }
        }
        Ok(())
    }

    /// Object shape of an intersection operand, if it has one
    fn object_operand(&self, ty: &TsType) -> Result<Option<ObjectType>, CompileError> {
        match ty {
            TsType::Object(obj) => Ok(Some(obj.clone())),
            TsType::Ref(name) => {
                if !self.decls.contains_key(name.as_str()) {
                    return Err(CompileError::UnknownType(name.clone()));
                }
                Ok(self.resolve_object(name, &mut Vec::new()).ok())
            }
            _ => Ok(None),
        }
    }

    fn emit_intersection(&mut self, parts: &[TsType]) -> Result<Value, CompileError> {
        let objects = parts
            .iter()
            .map(|t| self.object_operand(t))
            .collect::<Result<Option<Vec<_>>, _>>()?;
        if let Some(objects) = objects {
            let mut merged = ObjectType::default();
            for obj in objects {
                merge_members(&mut merged, obj);
            }
            return self.emit_object(&merged);
        }

        // closed objects inside allOf would reject each other's properties
        let mut all_of = Vec::with_capacity(parts.len());
        for part in parts {
            let mut schema = self.emit(part)?;
            if let (TsType::Object(_), Value::Object(map)) = (part, &mut schema) {
                if map.get("additionalProperties") == Some(&Value::Bool(false)) {
                    map.remove("additionalProperties");
                }
            }
            all_of.push(schema);
        }
        Ok(json!({ "allOf": all_of }))
    }

    fn emit_object(&mut self, obj: &ObjectType) -> Result<Value, CompileError> {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for m in &obj.members {
            let mut prop = self.emit(&m.ty)?;
            if let (Some(doc), Value::Object(map)) = (&m.doc, &mut prop) {
                map.insert("description".into(), json!(doc));
            }
            properties.insert(m.name.clone(), prop);
            if !m.optional {
                required.push(json!(m.name));
            }
        }
        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".into(), Value::Array(required));
        }
        let additional = match &obj.index {
            Some(ty) => self.emit(ty)?,
            None => Value::Bool(false),
        };
        schema.insert("additionalProperties".into(), additional);
        Ok(Value::Object(schema))
    }

    fn emit(&mut self, ty: &TsType) -> Result<Value, CompileError> {
        Ok(match ty {
            TsType::Keyword(kw) => match kw.json_type() {
                Some(t) => json!({ "type": t }),
                None => json!({}),
            },
            TsType::Literal(v) => json!({ "type": json_type_of(v), "const": v }),
            TsType::Array(item) => json!({ "type": "array", "items": self.emit(item)? }),
            TsType::Tuple(items) => {
                let items = items.iter().map(|t| self.emit(t)).collect::<Result<Vec<_>, _>>()?;
                let n = items.len();
                json!({ "type": "array", "items": items, "minItems": n, "maxItems": n })
            }
            TsType::Object(obj) => self.emit_object(obj)?,
            TsType::Record(value) => json!({ "type": "object", "additionalProperties": self.emit(value)? }),
            TsType::Union(alts) => self.emit_union(alts)?,
            TsType::Intersection(parts) => self.emit_intersection(parts)?,
            TsType::Ref(name) => {
                if !self.decls.contains_key(name.as_str()) {
                    return Err(CompileError::UnknownType(name.clone()));
                }
                self.pending.push_back(name.clone());
                json!({ "$ref": format!("#/definitions/{name}") })
            }
        })
    }

    fn emit_union(&mut self, alts: &[TsType]) -> Result<Value, CompileError> {
        let alts: Vec<&TsType> = alts
            .iter()
            .filter(|t| **t != TsType::Keyword(Keyword::Undefined))
            .collect();
        if alts.len() == 1 {
            return self.emit(alts[0]);
        }

        let literals: Option<Vec<Value>> = alts
            .iter()
            .map(|t| match t {
                TsType::Literal(v) => Some(v.clone()),
                TsType::Keyword(Keyword::Null) => Some(Value::Null),
                _ => None,
            })
            .collect();
        if let Some(values) = literals {
            let types = values.iter().map(json_type_of).collect();
            return Ok(json!({ "type": type_keyword(types), "enum": values }));
        }

        let primitives: Option<Vec<&'static str>> = alts
            .iter()
            .map(|t| match t {
                TsType::Keyword(kw) => kw.json_type(),
                _ => None,
            })
            .collect();
        if let Some(types) = primitives {
            return Ok(json!({ "type": type_keyword(types) }));
        }

        let any_of = alts.iter().map(|t| self.emit(t)).collect::<Result<Vec<_>, _>>()?;
        Ok(json!({ "anyOf": any_of }))
    }
}

/// References that stand directly in `ty`, outside any object, array or tuple
fn bare_refs(ty: &TsType) -> Vec<&str> {
    match ty {
        TsType::Ref(name) => vec![name.as_str()],
        TsType::Union(parts) | TsType::Intersection(parts) => parts.iter().flat_map(bare_refs).collect(),
        _ => Vec::new(),
    }
}

fn merge_members(into: &mut ObjectType, from: ObjectType) {
    for m in from.members {
        match into.members.iter_mut().find(|existing| existing.name == m.name) {
            Some(existing) => *existing = m,
            None => into.members.push(m),
        }
    }
    if from.index.is_some() {
        into.index = from.index;
    }
}

/// Compile TypeScript `source` into a JSON Schema for `type_name`
///
/// With [`ALL_TYPES`] every declaration lands in `definitions` and no root `$ref` is
/// set; otherwise the root refers to `type_name` and only the declarations reachable
/// from it are emitted.
pub fn compile_source(source: &str, type_name: &str) -> Result<Value, CompileError> {
    let mut parser = Parser {
        tokens: tokenize(source)?,
        pos: 0,
    };
    let decls = parser.parse_program()?;

    let mut emitter = Emitter {
        decls: decls.iter().map(|d| (d.name.as_str(), d)).collect(),
        pending: VecDeque::new(),
    };

    if type_name == ALL_TYPES {
        emitter.pending.extend(decls.iter().map(|d| d.name.clone()));
    } else if emitter.decls.contains_key(type_name) {
        emitter.pending.push_back(type_name.to_string());
    } else {
        return Err(CompileError::TypeNotFound(type_name.to_string()));
    }

    let mut definitions = Map::new();
    while let Some(name) = emitter.pending.pop_front() {
        if definitions.contains_key(&name) {
            continue;
        }
        let decl = emitter.decls[name.as_str()];
        let schema = emitter.definition(decl)?;
        definitions.insert(name, schema);
    }

    let mut root = Map::new();
    root.insert("$schema".into(), json!(DRAFT_07));
    if type_name != ALL_TYPES {
        root.insert("$ref".into(), json!(format!("#/definitions/{type_name}")));
    }
    root.insert("definitions".into(), Value::Object(definitions));
    Ok(Value::Object(root))
}

/// Read and compile a `.ts` declaration file
pub fn compile_file(path: &Path, type_name: &str) -> Result<Value, CompileError> {
    if path.extension().and_then(|e| e.to_str()) != Some("ts") {
        return Err(CompileError::UnsupportedSource(path.to_path_buf()));
    }
    let source = fs::read_to_string(path).map_err(|source| CompileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    compile_source(&source, type_name)
}
