//! Recursive-descent translator
//!
//! Walks the s-expression AST carrying `(parent, env)` context and builds a
//! [`QueryTree`]. `parent` is `None` at the root and becomes `Some` exactly
//! once, on entry into a `FIELD`/`RANGE`/user-header form; it is never
//! overwritten afterward, matching the reference design's "monotonic
//! context" rule. Dispatch is an ordered rule list: parameter reference,
//! non-parameter atom, empty list, list-headed-by-a-list, saved-squery
//! expansion, user-defined header, reserved `macro` outside a squery body,
//! built-in prefix-table match, unknown head.

use crate::backend::Backend;
use crate::environment::Environment;
use crate::error::{CompileError, CompileResult};
use crate::prefix_table::{self, CombineOp, Initial, PrefixEntry, PrefixFlags};
use crate::query_tree::{Op, QueryTree};
use crate::sexp::{AtomKind, Sexp};

/// The adopted field/range context once a `FIELD`- or `RANGE`-flagged form
/// (built-in or user-defined) has been entered.
#[derive(Debug, Clone)]
struct Parent {
    name: String,
    flags: PrefixFlags,
    /// Overrides `Backend::term_prefix` for synthetic user-defined headers,
    /// whose prefix string comes directly from `user_prefix_get`.
    prefix_override: Option<String>,
}

impl Parent {
    fn from_entry(entry: &PrefixEntry) -> Self {
        Self {
            name: entry.name.to_string(),
            flags: entry.flags,
            prefix_override: None,
        }
    }

    fn field_prefix<B: Backend + ?Sized>(&self, backend: &B) -> String {
        self.prefix_override
            .clone()
            .unwrap_or_else(|| backend.term_prefix(&self.name))
    }
}

/// Compile `text` into a [`QueryTree`] using `backend` for every external
/// collaboration (term prefixes, stemming, regex/range/infix/saved-query
/// resolution, diagnostics).
///
/// # Errors
/// Returns [`CompileError::BadQuerySyntax`] for any structural or semantic
/// violation of the query language, or whatever error a backend
/// collaborator raises.
pub fn compile<B: Backend>(backend: &B, text: &str) -> CompileResult<QueryTree> {
    let root = crate::sexp::parse(text).map_err(|err| log_error(backend, err))?;
    translate(backend, None, &Environment::empty(), &root)
}

/// Route an already-built error through the backend's diagnostic sink
/// before returning it, without changing the error itself.
fn log_error<B: Backend + ?Sized>(backend: &B, err: CompileError) -> CompileError {
    if let CompileError::BadQuerySyntax(message) = &err {
        backend.log(message);
    }
    err
}

/// Build a [`CompileError::BadQuerySyntax`], logged via the backend's own
/// diagnostic sink at the point it's raised.
fn bad_syntax<B: Backend + ?Sized>(backend: &B, message: impl Into<String>) -> CompileError {
    log_error(backend, CompileError::bad_syntax(message))
}

fn translate<B: Backend>(
    backend: &B,
    parent: Option<&Parent>,
    env: &Environment,
    node: &Sexp,
) -> CompileResult<QueryTree> {
    match node {
        Sexp::Atom { kind: AtomKind::Basic, text } if text.starts_with(',') => {
            translate_parameter(backend, parent, env, &text[1..])
        }
        Sexp::Atom { kind, text } => translate_atom(backend, parent, *kind, text),
        Sexp::List(items) if items.is_empty() => Ok(QueryTree::MatchAll),
        Sexp::List(items) => translate_list(backend, parent, env, items),
    }
}

fn translate_parameter<B: Backend>(
    backend: &B,
    parent: Option<&Parent>,
    env: &Environment,
    name: &str,
) -> CompileResult<QueryTree> {
    let binding = env
        .resolve(name)
        .ok_or_else(|| bad_syntax(backend, format!("undefined parameter '{name}'")))?;
    let bound_sexp = binding.sexp.clone();
    translate(backend, parent, &binding.defining_env, &bound_sexp)
}

fn translate_atom<B: Backend>(
    backend: &B,
    parent: Option<&Parent>,
    kind: AtomKind,
    text: &str,
) -> CompileResult<QueryTree> {
    if kind == AtomKind::Basic && text == "*" {
        return wildcard_query(backend, parent, "");
    }

    let stripped;
    let text = if parent.is_some_and(|p| p.flags.contains(PrefixFlags::PATHNAME)) {
        stripped = text.strip_suffix('/').unwrap_or(text);
        stripped
    } else {
        text
    };

    if let Some(parent) = parent {
        if parent.flags.contains(PrefixFlags::BOOLEAN) {
            return Ok(QueryTree::Term(format!("{}{text}", parent.field_prefix(backend))));
        }
        return single_term(backend, &parent.field_prefix(backend), kind, text);
    }

    // Bare atom at the root: implicit OR over every FIELD-flagged prefix.
    let mut children = Vec::new();
    for entry in prefix_table::PREFIX_TABLE {
        if !entry.flags.contains(PrefixFlags::FIELD) {
            continue;
        }
        let prefix = backend.term_prefix(entry.name);
        children.push(single_term(backend, &prefix, kind, text)?);
    }
    Ok(QueryTree::fold(Op::Or, QueryTree::MatchNothing, children))
}

/// A single atom already under a (non-boolean) field prefix: a stemmed term
/// for a single basic word, a phrase otherwise.
fn single_term<B: Backend>(
    backend: &B,
    prefix: &str,
    kind: AtomKind,
    text: &str,
) -> CompileResult<QueryTree> {
    if kind == AtomKind::Basic && backend.is_single_word(text) {
        let lowered = backend.unicode_lower(text);
        return Ok(QueryTree::Term(format!("Z{prefix}{}", backend.stem(&lowered))));
    }
    let words: Vec<String> = backend
        .unicode_words(text)
        .into_iter()
        .map(|word| format!("{prefix}{word}"))
        .collect();
    Ok(QueryTree::Phrase(words))
}

fn wildcard_query<B: Backend>(
    backend: &B,
    parent: Option<&Parent>,
    match_text: &str,
) -> CompileResult<QueryTree> {
    if let Some(parent) = parent {
        if !parent.flags.contains(PrefixFlags::WILDCARD) {
            return Err(bad_syntax(backend, format!(
                "'{}' does not support wildcard queries",
                parent.name
            )));
        }
    }
    let prefix = parent.map(|p| p.field_prefix(backend)).unwrap_or_default();
    Ok(QueryTree::Wildcard(format!("{prefix}{}", backend.unicode_lower(match_text))))
}

fn translate_list<B: Backend>(
    backend: &B,
    parent: Option<&Parent>,
    env: &Environment,
    items: &[Sexp],
) -> CompileResult<QueryTree> {
    let head = &items[0];
    let tail = &items[1..];

    let head_text = match head {
        Sexp::List(_) => {
            // Not a reserved form — the only list-headed list we permit is
            // an immediately-applied anonymous macro.
            if is_macro_form(head) {
                return apply_macro(backend, parent, env, head, tail);
            }
            return Err(bad_syntax(backend, "unexpected list in operation position"));
        }
        Sexp::Atom { text, .. } => text.as_str(),
    };

    if let Some(tree) = translate_saved_squery(backend, parent, env, head_text, tail)? {
        return Ok(tree);
    }

    if let Some(prefix) = backend.user_prefix_get(head_text) {
        if parent.is_some() {
            return Err(bad_syntax(backend, format!(
                "nested field: '{head_text}' inside '{}'",
                parent.expect("checked").name
            )));
        }
        let header_parent = Parent {
            name: head_text.to_string(),
            flags: PrefixFlags::FIELD | PrefixFlags::WILDCARD,
            prefix_override: Some(prefix),
        };
        let children = translate_each(backend, Some(&header_parent), env, tail)?;
        return Ok(QueryTree::fold(Op::And, QueryTree::MatchAll, children));
    }

    if head_text == "macro" {
        return Err(bad_syntax(backend, "macro definition not permitted here"));
    }

    let Some(entry) = prefix_table::lookup(head_text) else {
        return Err(bad_syntax(backend, format!("unknown prefix '{head_text}'")));
    };

    let mut parent_owned = None;
    let mut parent_ref = parent;
    if entry.flags.intersects(PrefixFlags::FIELD | PrefixFlags::RANGE) {
        if let Some(parent) = parent {
            return Err(bad_syntax(backend, format!(
                "nested field: '{}' inside '{}'",
                entry.name, parent.name
            )));
        }
        parent_owned = Some(Parent::from_entry(entry));
        parent_ref = parent_owned.as_ref();
    }

    if entry.flags.contains(PrefixFlags::ORPHAN) && parent_ref.is_some() {
        return Err(bad_syntax(backend, format!(
            "'{}' not supported inside '{}'",
            entry.name,
            parent_ref.expect("checked").name
        )));
    }

    if entry.flags.contains(PrefixFlags::SINGLE)
        && !matches!(tail, [Sexp::Atom { .. }])
    {
        return Err(bad_syntax(backend, format!(
            "'{}' expects single atom as argument",
            entry.name
        )));
    }

    if entry.flags.contains(PrefixFlags::RANGE) {
        return translate_range(backend, entry.name, tail);
    }

    if entry.name == "infix" {
        let text = single_atom_text(tail);
        return backend.infix_parse(text);
    }

    if entry.name == "query" {
        let name = single_atom_text(tail);
        return backend.named_query(name);
    }

    if matches!(entry.op, CombineOp::Wildcard) {
        let expanded = expand_term(backend, env, &tail[0])?;
        return wildcard_query(backend, parent_ref, &expanded);
    }

    if entry.flags.contains(PrefixFlags::DO_REGEX) {
        let field_parent = parent_ref.ok_or_else(|| {
            bad_syntax(backend, format!("illegal '{}' outside field", entry.name))
        })?;
        if !field_parent.flags.contains(PrefixFlags::REGEX) {
            return Err(bad_syntax(backend, format!(
                "'{}' not supported in field '{}'",
                entry.name, field_parent.name
            )));
        }
        let pattern = expand_term(backend, env, &tail[0])?;
        return backend.regex_to_query(&field_parent.name, &pattern);
    }

    if entry.flags.contains(PrefixFlags::DO_EXPAND) {
        let field_parent = parent_ref.ok_or_else(|| {
            bad_syntax(backend, format!("illegal '{}' outside field", entry.name))
        })?;
        if !field_parent.flags.contains(PrefixFlags::EXPAND) {
            return Err(bad_syntax(backend, format!(
                "'{}' unsupported inside '{}'",
                entry.name, field_parent.name
            )));
        }
        let op = Op::try_from(entry.op).unwrap_or(Op::And);
        let initial = initial_query(entry.initial);
        // Children of matching/of are translated as if at top level: no
        // parent, no macro-parameter environment.
        let children = translate_each(backend, None, &Environment::empty(), tail)?;
        let subquery = QueryTree::fold(op, initial, children);
        return backend.query_expand(&field_parent.name, subquery);
    }

    let op = Op::try_from(entry.op).map_err(|()| {
        bad_syntax(backend, format!("'{}' is not a combining operator", entry.name))
    })?;
    let initial = initial_query(entry.initial);
    let children = translate_each(backend, parent_ref, env, tail)?;
    Ok(QueryTree::fold(op, initial, children))
}

fn initial_query(initial: Initial) -> QueryTree {
    match initial {
        Initial::MatchAll => QueryTree::MatchAll,
        Initial::MatchNothing => QueryTree::MatchNothing,
    }
}

fn translate_each<B: Backend>(
    backend: &B,
    parent: Option<&Parent>,
    env: &Environment,
    tail: &[Sexp],
) -> CompileResult<Vec<QueryTree>> {
    tail.iter().map(|child| translate(backend, parent, env, child)).collect()
}

fn single_atom_text(tail: &[Sexp]) -> &str {
    tail[0].atom_text().expect("SINGLE flag already validated a lone atom")
}

/// Chase a chain of `,param` references down to a concrete atom, matching
/// the reference design's `_sexp_expand_term`. Used by `starts-with` and by
/// the `regex`/`rx` heads, both of which need a literal string rather than
/// a translated sub-query.
fn expand_term<B: Backend + ?Sized>(backend: &B, env: &Environment, node: &Sexp) -> CompileResult<String> {
    let mut current = node.clone();
    let mut current_env = env.clone();
    loop {
        match &current {
            Sexp::Atom { kind: AtomKind::Basic, text } if text.starts_with(',') => {
                let name = text[1..].to_string();
                let binding = current_env
                    .resolve(&name)
                    .ok_or_else(|| bad_syntax(backend, format!("undefined parameter '{name}'")))?;
                let next_sexp = binding.sexp.clone();
                current_env = binding.defining_env;
                current = next_sexp;
            }
            Sexp::Atom { text, .. } => return Ok(text.clone()),
            Sexp::List(_) => {
                return Err(bad_syntax(backend, "expects single atom as argument"))
            }
        }
    }
}

fn translate_range<B: Backend>(backend: &B, name: &str, tail: &[Sexp]) -> CompileResult<QueryTree> {
    if tail.is_empty() {
        return Ok(QueryTree::MatchAll);
    }
    if tail.len() > 2 {
        return Err(bad_syntax(backend, format!(
            "'{name}' expects maximum of two arguments"
        )));
    }

    let from_text = tail[0]
        .atom_text()
        .ok_or_else(|| bad_syntax(backend, format!("expected atom as first argument of '{name}'")))?;
    let from = if from_text == "*" { String::new() } else { from_text.to_string() };

    let to = if let Some(second) = tail.get(1) {
        let to_text = second
            .atom_text()
            .ok_or_else(|| bad_syntax(backend, format!("expected atom as second argument of '{name}'")))?;
        if to_text == "*" { String::new() } else { to_text.to_string() }
    } else {
        from.clone()
    };

    match name {
        "date" => backend.date_range_to_query(&from, &to),
        "lastmod" => backend.lastmod_range_to_query(&from, &to),
        other => Err(bad_syntax(backend, format!("unimplemented range prefix: '{other}'"))),
    }
}

fn is_macro_form(node: &Sexp) -> bool {
    matches!(node.as_list(), Some([first, ..]) if first.is_basic_atom("macro"))
}

fn translate_saved_squery<B: Backend>(
    backend: &B,
    parent: Option<&Parent>,
    env: &Environment,
    head_text: &str,
    tail: &[Sexp],
) -> CompileResult<Option<QueryTree>> {
    let Some(expansion) = backend.config_get(&format!("squery.{head_text}")) else {
        return Ok(None);
    };
    if expansion.is_empty() {
        return Ok(None);
    }
    let saved = crate::sexp::parse(&expansion).map_err(|err| log_error(backend, err))?;
    if is_macro_form(&saved) {
        return apply_macro(backend, parent, env, &saved, tail).map(Some);
    }
    translate(backend, parent, env, &saved).map(Some)
}

/// Apply `(macro (p1 .. pn) body)` to `args`, binding each parameter onto
/// the caller's environment with the caller's environment as its
/// `defining_env` (call-by-name with lexical capture), then translate
/// `body` under the caller's `parent` and the extended environment.
fn apply_macro<B: Backend>(
    backend: &B,
    parent: Option<&Parent>,
    env: &Environment,
    macro_form: &Sexp,
    args: &[Sexp],
) -> CompileResult<QueryTree> {
    let items = macro_form.as_list().expect("is_macro_form checked this is a list");
    let params_node = items
        .get(1)
        .ok_or_else(|| bad_syntax(backend, "missing (possibly empty) list of arguments to macro"))?;
    let params = params_node
        .as_list()
        .ok_or_else(|| bad_syntax(backend, "missing (possibly empty) list of arguments to macro"))?;
    let body = items.get(2).ok_or_else(|| bad_syntax(backend, "missing body of macro"))?;

    let mut new_env = env.clone();
    let mut params_iter = params.iter();
    let mut args_iter = args.iter();
    loop {
        match (params_iter.next(), args_iter.next()) {
            (Some(param), Some(arg)) => {
                let name = match param {
                    Sexp::Atom { kind: AtomKind::Basic, text } => text.clone(),
                    _ => return Err(bad_syntax(backend, "macro parameters must be unquoted atoms")),
                };
                new_env = new_env.bind(name, arg.clone(), env.clone());
            }
            (Some(_), None) => return Err(bad_syntax(backend, "too few arguments to macro")),
            (None, Some(_)) => return Err(bad_syntax(backend, "too many arguments to macro")),
            (None, None) => break,
        }
    }

    translate(backend, parent, &new_env, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::stub::StubBackend;

    fn compile(backend: &StubBackend, text: &str) -> CompileResult<QueryTree> {
        super::compile(backend, text)
    }

    #[test]
    fn empty_list_is_match_all() {
        let backend = StubBackend::new();
        assert_eq!(compile(&backend, "()").unwrap(), QueryTree::MatchAll);
    }

    #[test]
    fn and_with_no_children_is_match_all() {
        let backend = StubBackend::new();
        assert_eq!(compile(&backend, "(and)").unwrap(), QueryTree::MatchAll);
    }

    #[test]
    fn or_with_no_children_is_match_nothing() {
        let backend = StubBackend::new();
        assert_eq!(compile(&backend, "(or)").unwrap(), QueryTree::MatchNothing);
    }

    #[test]
    fn not_tag_folds_and_not_over_match_all() {
        // `(tag spam)` compiles to its own AND-fold first
        // (`AND(MatchAll, Term(...))`), which then becomes the single right
        // operand of `not`'s AND_NOT-fold.
        let backend = StubBackend::new();
        let tree = compile(&backend, "(not (tag spam))").unwrap();
        let tag_term = QueryTree::Combine(Op::And, vec![QueryTree::MatchAll, QueryTree::Term("Ttag:spam".into())]);
        assert_eq!(tree, QueryTree::Combine(Op::AndNot, vec![QueryTree::MatchAll, tag_term]));
    }

    #[test]
    fn from_phrase_combines_and_over_match_all() {
        let backend = StubBackend::new();
        let tree = compile(&backend, r#"(from "Alice Smith")"#).unwrap();
        assert_eq!(
            tree,
            QueryTree::Combine(
                Op::And,
                vec![
                    QueryTree::MatchAll,
                    QueryTree::Phrase(vec!["Ffrom:alice".into(), "Ffrom:smith".into()])
                ]
            )
        );
    }

    #[test]
    fn subject_wildcard() {
        // `*` still passes through `subject`'s own AND-fold like any other
        // child, so the wildcard comes back wrapped in the fold's usual
        // `AND(MatchAll, ...)` shape.
        let backend = StubBackend::new();
        let tree = compile(&backend, "(subject *)").unwrap();
        assert_eq!(
            tree,
            QueryTree::Combine(Op::And, vec![QueryTree::MatchAll, QueryTree::Wildcard("Fsubject:".into())])
        );
    }

    #[test]
    fn folder_strips_trailing_slash() {
        let backend = StubBackend::new();
        let tree = compile(&backend, r#"(folder "inbox/")"#).unwrap();
        assert_eq!(
            tree,
            QueryTree::Combine(Op::Or, vec![QueryTree::MatchNothing, QueryTree::Term("Ffolder:inbox".into())])
        );
    }

    #[test]
    fn date_range_delegates_to_backend() {
        let backend = StubBackend::new();
        let tree = compile(&backend, "(date 2020 2021)").unwrap();
        match tree {
            QueryTree::Opaque(opaque) => {
                assert_eq!(opaque.payload["from"], "2020");
                assert_eq!(opaque.payload["to"], "2021");
            }
            other => panic!("expected opaque date range, got {other:?}"),
        }
    }

    #[test]
    fn date_range_with_open_start() {
        let backend = StubBackend::new();
        let tree = compile(&backend, "(date * 2021)").unwrap();
        match tree {
            QueryTree::Opaque(opaque) => {
                assert_eq!(opaque.payload["from"], "");
                assert_eq!(opaque.payload["to"], "2021");
            }
            other => panic!("expected opaque date range, got {other:?}"),
        }
    }

    #[test]
    fn anonymous_macro_applied_inline() {
        let backend = StubBackend::new();
        let direct = compile(&backend, "(from alice)").unwrap();
        let via_macro = compile(&backend, "((macro (f) (from ,f)) alice)").unwrap();
        assert_eq!(direct, via_macro);
    }

    #[test]
    fn saved_squery_macro_application() {
        let backend = StubBackend::new().with_squery("recent-from", "(macro (f) (from ,f))");
        let tree = compile(&backend, "(recent-from alice)").unwrap();
        let direct = compile(&backend, "(from alice)").unwrap();
        assert_eq!(tree, direct);
    }

    #[test]
    fn unknown_head_is_bad_syntax() {
        let backend = StubBackend::new();
        assert!(matches!(
            compile(&backend, "(foo bar)"),
            Err(CompileError::BadQuerySyntax(_))
        ));
    }

    #[test]
    fn orphan_regex_at_top_level_is_rejected() {
        let backend = StubBackend::new();
        assert!(matches!(
            compile(&backend, r#"(regex "^a.*")"#),
            Err(CompileError::BadQuerySyntax(_))
        ));
    }

    #[test]
    fn regex_under_field_delegates_to_backend() {
        let backend = StubBackend::new();
        let tree = compile(&backend, r#"(subject (regex "^hi"))"#).unwrap();
        match tree {
            QueryTree::Combine(Op::And, children) => {
                assert_eq!(children[0], QueryTree::MatchAll);
                match &children[1] {
                    QueryTree::Opaque(opaque) => {
                        assert_eq!(opaque.payload["field"], "subject");
                        assert_eq!(opaque.payload["pattern"], "^hi");
                    }
                    other => panic!("expected opaque regex leaf, got {other:?}"),
                }
            }
            other => panic!("expected AND(MatchAll, regex-leaf), got {other:?}"),
        }
    }

    #[test]
    fn nested_field_is_rejected() {
        let backend = StubBackend::new();
        assert!(matches!(
            compile(&backend, "(from (subject alice))"),
            Err(CompileError::BadQuerySyntax(_))
        ));
    }

    #[test]
    fn pathname_round_trips_with_or_without_trailing_slash() {
        let backend = StubBackend::new();
        let with_slash = compile(&backend, r#"(folder "a/b/")"#).unwrap();
        let without_slash = compile(&backend, r#"(folder "a/b")"#).unwrap();
        assert_eq!(with_slash, without_slash);
    }

    #[test]
    fn boolean_field_is_not_stemmed_or_lowercased() {
        let backend = StubBackend::new();
        let tree = compile(&backend, "(tag Running)").unwrap();
        assert_eq!(
            tree,
            QueryTree::Combine(Op::And, vec![QueryTree::MatchAll, QueryTree::Term("Ttag:Running".into())])
        );
    }

    #[test]
    fn non_boolean_single_word_is_stemmed_and_lowercased() {
        let backend = StubBackend::new();
        let tree = compile(&backend, "(body Running)").unwrap();
        assert_eq!(
            tree,
            QueryTree::Combine(Op::And, vec![QueryTree::MatchAll, QueryTree::Term("ZFbody:runn".into())])
        );
    }

    #[test]
    fn implicit_or_over_field_set_for_bare_root_atom() {
        let backend = StubBackend::new();
        let tree = compile(&backend, "alice").unwrap();
        match tree {
            QueryTree::Combine(Op::Or, _) => {}
            other => panic!("expected an OR-combined implicit field query, got {other:?}"),
        }
    }

    #[test]
    fn macro_parameter_resolves_in_defining_environment() {
        // ((macro (x) (macro (y) (from ,x))) alice) binds x=alice in the
        // outer call, then immediately invokes the resulting inner form —
        // the inner macro still has access to x through the environment
        // threaded by apply_macro.
        let backend = StubBackend::new();
        let tree =
            compile(&backend, "((macro (x) (from ,x)) alice)").unwrap();
        let direct = compile(&backend, "(from alice)").unwrap();
        assert_eq!(tree, direct);
    }

    #[test]
    fn user_defined_header_combines_with_and() {
        let backend = StubBackend::new().with_user_prefix("x-priority", "XPRIO:");
        let tree = compile(&backend, "(x-priority urgent)").unwrap();
        assert_eq!(
            tree,
            QueryTree::Combine(Op::And, vec![QueryTree::MatchAll, QueryTree::Term("ZXPRIO:urgent".into())])
        );
    }

    #[test]
    fn user_defined_header_rejects_nesting() {
        let backend = StubBackend::new().with_user_prefix("x-priority", "XPRIO:");
        assert!(matches!(
            compile(&backend, "(from (x-priority urgent))"),
            Err(CompileError::BadQuerySyntax(_))
        ));
    }

    #[test]
    fn reserved_macro_head_outside_squery_is_rejected() {
        let backend = StubBackend::new();
        assert!(matches!(
            compile(&backend, "(macro (x) (from ,x))"),
            Err(CompileError::BadQuerySyntax(_))
        ));
    }

    #[test]
    fn infix_delegates_to_backend() {
        let backend = StubBackend::new();
        let tree = compile(&backend, r#"(infix "subject:hello")"#).unwrap();
        match tree {
            QueryTree::Opaque(opaque) => assert_eq!(opaque.payload["text"], "subject:hello"),
            other => panic!("expected opaque infix leaf, got {other:?}"),
        }
    }

    #[test]
    fn matching_expands_independently_of_outer_environment() {
        let backend = StubBackend::new();
        // ,f is only bound in the outer macro's environment; `matching`
        // translates its children at "top level" with an empty
        // environment, so a leaked parameter reference must fail.
        let result = compile(&backend, "((macro (f) (attachment (matching ,f))) x)");
        assert!(matches!(result, Err(CompileError::BadQuerySyntax(_))));
    }

    /// Wraps a `StubBackend`, recording every `log` call instead of routing
    /// it through `tracing`, so a test can assert a diagnostic was actually
    /// raised at the backend seam.
    #[derive(Default)]
    struct RecordingBackend {
        inner: StubBackend,
        logged: std::cell::RefCell<Vec<String>>,
    }

    impl Backend for RecordingBackend {
        fn term_prefix(&self, field_name: &str) -> String {
            self.inner.term_prefix(field_name)
        }
        fn stem(&self, word: &str) -> String {
            self.inner.stem(word)
        }
        fn unicode_lower(&self, text: &str) -> String {
            self.inner.unicode_lower(text)
        }
        fn regex_to_query(&self, field_name: &str, pattern: &str) -> CompileResult<QueryTree> {
            self.inner.regex_to_query(field_name, pattern)
        }
        fn date_range_to_query(&self, from: &str, to: &str) -> CompileResult<QueryTree> {
            self.inner.date_range_to_query(from, to)
        }
        fn lastmod_range_to_query(&self, from: &str, to: &str) -> CompileResult<QueryTree> {
            self.inner.lastmod_range_to_query(from, to)
        }
        fn infix_parse(&self, text: &str) -> CompileResult<QueryTree> {
            self.inner.infix_parse(text)
        }
        fn named_query(&self, name: &str) -> CompileResult<QueryTree> {
            self.inner.named_query(name)
        }
        fn query_expand(&self, field_name: &str, sub_tree: QueryTree) -> CompileResult<QueryTree> {
            self.inner.query_expand(field_name, sub_tree)
        }
        fn config_get(&self, key: &str) -> Option<String> {
            self.inner.config_get(key)
        }
        fn user_prefix_get(&self, name: &str) -> Option<String> {
            self.inner.user_prefix_get(name)
        }
        fn log(&self, message: &str) {
            self.logged.borrow_mut().push(message.to_string());
        }
    }

    #[test]
    fn bad_query_syntax_is_logged_through_the_backend() {
        let backend = RecordingBackend::default();
        let result = super::compile(&backend, "(foo bar)");
        assert!(matches!(result, Err(CompileError::BadQuerySyntax(_))));
        assert_eq!(backend.logged.borrow().len(), 1);
        assert!(backend.logged.borrow()[0].contains("unknown prefix"));
    }

    #[test]
    fn malformed_s_expression_is_logged_through_the_backend() {
        let backend = RecordingBackend::default();
        let result = super::compile(&backend, "(and foo");
        assert!(matches!(result, Err(CompileError::BadQuerySyntax(_))));
        assert_eq!(backend.logged.borrow().len(), 1);
    }
}
