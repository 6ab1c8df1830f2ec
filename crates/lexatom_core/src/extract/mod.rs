//! Clause-scoped obligation extraction.
//!
//! # Responsibility
//! - Detect modality per clause and bind actor/action/object atoms.
//! - Collect condition, scope and lifecycle atoms from literal spans.
//! - Attach caller-supplied reference identities by clause provenance.
//!
//! # Invariants
//! - A clause with no modal phrase produces no obligation; extraction
//!   never infers an obligation from context.
//! - Every atom is traceable to a token span; nothing is synthesized.
//! - Reference identities are copied from caller input only.

pub mod modality;

use crate::model::node::{ClauseSpan, LogicTree, TokenSpan};
use crate::model::obligation::{
    ClausePhrase, ConditionAtom, ConditionTriggerKind, LifecycleKind, LifecycleTrigger,
    ObligationAtom, ScopeAtom, ScopeCategory,
};
use crate::model::reference::ReferenceMention;
use crate::model::token::Token;
use crate::tree::builder::{CONDITION_TRIGGERS, EXCEPTION_TRIGGERS};
use modality::{find_modal, ModalMatch};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

/// Prepositions that end an object phrase.
pub const BOUNDARY_PREPOSITIONS: &[&str] = &[
    "on", "in", "within", "during", "while", "until", "upon", "when",
];

/// Cues that open an activation lifecycle window (≤3 lookahead tokens).
pub const ACTIVATION_CUES: &[&str] = &["on", "upon", "when", "while", "once"];

/// Cues that open a termination lifecycle window (≤4 lookahead tokens).
pub const TERMINATION_CUES: &[&str] = &["until", "cease", "ceases"];

const ACTIVATION_LOOKAHEAD: usize = 3;
const TERMINATION_LOOKAHEAD: usize = 4;

/// Fixed phrase → scope category table. Windows are matched
/// longest-first, so maximal windows win.
pub const SCOPE_PATTERNS: &[(&str, ScopeCategory)] = &[
    ("at all times", ScopeCategory::Time),
    ("from time to time", ScopeCategory::Time),
    ("during the transition period", ScopeCategory::Time),
    ("within the reporting period", ScopeCategory::Time),
    ("on each anniversary", ScopeCategory::Time),
    ("in australia", ScopeCategory::Place),
    ("within the state", ScopeCategory::Place),
    ("within the jurisdiction", ScopeCategory::Place),
    ("on the premises", ScopeCategory::Place),
    ("for the purposes of", ScopeCategory::Context),
    ("in relation to", ScopeCategory::Context),
    ("in connection with", ScopeCategory::Context),
    ("in respect of", ScopeCategory::Context),
];

const MAX_SCOPE_WINDOW: usize = 6;

/// Leading numbering/bullet shapes stripped from actor phrases:
/// "(1)", "12.", "3)", "7", "(a)", "b.", and bare bracket/period runs.
/// A bare single letter is left alone so articles survive.
static NUMBERING_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\(\d+\)|\d+[.)]|\d+|\([a-z]\)|[a-z][.)]|[().]+)$")
        .unwrap_or_else(|err| unreachable!("invalid numbering pattern: {err}"))
});

/// Extraction toggles. Both bindings default to on; disabling one
/// removes that atom from the obligation and therefore changes the
/// resulting identity hash.
#[derive(Debug, Clone, Copy)]
pub struct ExtractorConfig {
    pub enable_actor_binding: bool,
    pub enable_action_binding: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            enable_actor_binding: true,
            enable_action_binding: true,
        }
    }
}

/// Extracts zero or one obligation per clause of the tree.
///
/// `mentions` maps clause ids to externally resolved reference
/// mentions; only hashes whose provenance names the clause are bound.
pub fn extract_obligations(
    tokens: &[Token],
    tree: &LogicTree,
    mentions: &BTreeMap<String, Vec<ReferenceMention>>,
    config: &ExtractorConfig,
) -> Vec<ObligationAtom> {
    tree.clause_spans()
        .iter()
        .filter_map(|clause| extract_clause_obligation(tokens, tree, clause, mentions, config))
        .collect()
}

fn extract_clause_obligation(
    tokens: &[Token],
    tree: &LogicTree,
    clause: &ClauseSpan,
    mentions: &BTreeMap<String, Vec<ReferenceMention>>,
    config: &ExtractorConfig,
) -> Option<ObligationAtom> {
    let (start, end) = clause.span;
    let clause_tokens = tokens.get(start..end)?;
    let normalized: Vec<String> = clause_tokens
        .iter()
        .map(|token| token.normalized())
        .collect();

    let modal = find_modal(&normalized)?;

    let actor = bind_actor(clause_tokens, &normalized, &modal, clause, start);
    let (action, object) = bind_action_object(clause_tokens, &normalized, &modal, clause, start);

    let obligation = ObligationAtom {
        obligation_type: modal.obligation_type,
        modality: modal.phrase.to_string(),
        clause_id: clause.clause_id.clone(),
        actor: if config.enable_actor_binding {
            actor
        } else {
            None
        },
        action: if config.enable_action_binding {
            action
        } else {
            None
        },
        object,
        reference_identities: bound_reference_hashes(&clause.clause_id, mentions),
        conditions: collect_conditions(clause_tokens, &normalized, clause, start),
        scopes: collect_scopes(clause_tokens, &normalized, clause, start),
        lifecycle: collect_lifecycle(clause_tokens, &normalized, clause, start),
        span: clause.span,
        source_id: tree.source_id().to_string(),
    };
    Some(obligation)
}

/// Actor: tokens strictly before the modal span, with leading
/// numbering/bullet tokens stripped. Empty after stripping ⇒ no actor.
fn bind_actor(
    clause_tokens: &[Token],
    normalized: &[String],
    modal: &ModalMatch,
    clause: &ClauseSpan,
    clause_start: usize,
) -> Option<ClausePhrase> {
    let mut first = 0;
    while first < modal.start && is_numbering_token(&clause_tokens[first].text) {
        first += 1;
    }
    if first >= modal.start {
        return None;
    }
    phrase_from_range(
        clause_tokens,
        normalized,
        first..modal.start,
        clause,
        clause_start,
    )
}

/// Action/object: tokens strictly after the modal span, skipping a
/// leading "to". First remaining token is the action; following tokens
/// up to the first boundary preposition form the object.
fn bind_action_object(
    clause_tokens: &[Token],
    normalized: &[String],
    modal: &ModalMatch,
    clause: &ClauseSpan,
    clause_start: usize,
) -> (Option<ClausePhrase>, Option<ClausePhrase>) {
    let mut cursor = modal.end;
    if cursor < normalized.len() && normalized[cursor] == "to" {
        cursor += 1;
    }
    while cursor < normalized.len() && normalized[cursor].is_empty() {
        cursor += 1;
    }
    if cursor >= normalized.len() {
        return (None, None);
    }

    let action = phrase_from_range(
        clause_tokens,
        normalized,
        cursor..cursor + 1,
        clause,
        clause_start,
    );

    let mut object_end = cursor + 1;
    while object_end < normalized.len()
        && !BOUNDARY_PREPOSITIONS.contains(&normalized[object_end].as_str())
    {
        object_end += 1;
    }
    let object = phrase_from_range(
        clause_tokens,
        normalized,
        cursor + 1..object_end,
        clause,
        clause_start,
    );
    (action, object)
}

/// Builds a phrase atom from a clause-relative token range, dropping
/// tokens that normalize to nothing (bare punctuation).
fn phrase_from_range(
    clause_tokens: &[Token],
    normalized: &[String],
    range: std::ops::Range<usize>,
    clause: &ClauseSpan,
    clause_start: usize,
) -> Option<ClausePhrase> {
    let mut texts = Vec::new();
    let mut normals = Vec::new();
    let mut first: Option<usize> = None;
    let mut last = 0;
    for index in range {
        if index >= clause_tokens.len() || normalized[index].is_empty() {
            continue;
        }
        texts.push(clause_tokens[index].text.as_str());
        normals.push(normalized[index].as_str());
        first.get_or_insert(index);
        last = index;
    }
    let first = first?;
    Some(ClausePhrase {
        text: texts.join(" "),
        normalized: normals.join(" "),
        span: (clause_start + first, clause_start + last + 1),
        clause_id: clause.clause_id.clone(),
    })
}

/// Every trigger-lexicon token becomes a condition atom; duplicates of
/// the same trigger kind collapse to the first occurrence.
fn collect_conditions(
    clause_tokens: &[Token],
    normalized: &[String],
    clause: &ClauseSpan,
    clause_start: usize,
) -> Vec<ConditionAtom> {
    let mut seen: BTreeSet<ConditionTriggerKind> = BTreeSet::new();
    let mut conditions = Vec::new();
    for (index, token) in clause_tokens.iter().enumerate() {
        let surface = normalized[index].as_str();
        let lemma = token.normalized_lemma();
        let kind = if CONDITION_TRIGGERS.contains(&surface)
            || CONDITION_TRIGGERS.contains(&lemma.as_str())
        {
            ConditionTriggerKind::Condition
        } else if EXCEPTION_TRIGGERS.contains(&surface)
            || EXCEPTION_TRIGGERS.contains(&lemma.as_str())
        {
            ConditionTriggerKind::Exception
        } else {
            continue;
        };
        if !seen.insert(kind) {
            continue;
        }
        conditions.push(ConditionAtom {
            trigger: kind,
            text: token.text.clone(),
            normalized: surface.to_string(),
            span: (clause_start + index, clause_start + index + 1),
            clause_id: clause.clause_id.clone(),
        });
    }
    conditions
}

/// Maximal 1–6 token windows matching the scope phrase table,
/// deduplicated by `(category, span)`.
fn collect_scopes(
    clause_tokens: &[Token],
    normalized: &[String],
    clause: &ClauseSpan,
    clause_start: usize,
) -> Vec<ScopeAtom> {
    let mut seen: BTreeSet<(ScopeCategory, TokenSpan)> = BTreeSet::new();
    let mut scopes = Vec::new();
    let mut index = 0;
    while index < normalized.len() {
        let mut advanced = false;
        for window in (1..=MAX_SCOPE_WINDOW.min(normalized.len() - index)).rev() {
            let slice = &normalized[index..index + window];
            if slice.iter().any(|value| value.is_empty()) {
                continue;
            }
            let candidate = slice.join(" ");
            let Some((_, category)) = SCOPE_PATTERNS
                .iter()
                .find(|(phrase, _)| *phrase == candidate)
            else {
                continue;
            };
            let span = (clause_start + index, clause_start + index + window);
            if seen.insert((*category, span)) {
                scopes.push(ScopeAtom {
                    category: *category,
                    text: clause_tokens[index..index + window]
                        .iter()
                        .map(|token| token.text.as_str())
                        .collect::<Vec<_>>()
                        .join(" "),
                    normalized: candidate,
                    span,
                    clause_id: clause.clause_id.clone(),
                });
            }
            index += window;
            advanced = true;
            break;
        }
        if !advanced {
            index += 1;
        }
    }
    scopes
}

/// Termination and activation cues each open a fixed lookahead window.
fn collect_lifecycle(
    clause_tokens: &[Token],
    normalized: &[String],
    clause: &ClauseSpan,
    clause_start: usize,
) -> Vec<LifecycleTrigger> {
    let mut triggers = Vec::new();
    for (index, value) in normalized.iter().enumerate() {
        let (kind, lookahead) = if TERMINATION_CUES.contains(&value.as_str()) {
            (LifecycleKind::Termination, TERMINATION_LOOKAHEAD)
        } else if ACTIVATION_CUES.contains(&value.as_str()) {
            (LifecycleKind::Activation, ACTIVATION_LOOKAHEAD)
        } else {
            continue;
        };
        let window_end = (index + 1 + lookahead).min(normalized.len());
        let texts: Vec<&str> = clause_tokens[index..window_end]
            .iter()
            .map(|token| token.text.as_str())
            .collect();
        let normals: Vec<&str> = normalized[index..window_end]
            .iter()
            .filter(|value| !value.is_empty())
            .map(String::as_str)
            .collect();
        triggers.push(LifecycleTrigger {
            kind,
            text: texts.join(" "),
            normalized: normals.join(" "),
            span: (clause_start + index, clause_start + window_end),
            clause_id: clause.clause_id.clone(),
        });
    }
    triggers
}

/// Reference hashes whose provenance names this clause id.
fn bound_reference_hashes(
    clause_id: &str,
    mentions: &BTreeMap<String, Vec<ReferenceMention>>,
) -> BTreeSet<String> {
    mentions
        .get(clause_id)
        .into_iter()
        .flatten()
        .filter(|mention| mention.clause_id == clause_id)
        .map(|mention| mention.identity_hash.clone())
        .collect()
}

fn is_numbering_token(text: &str) -> bool {
    NUMBERING_TOKEN.is_match(&text.to_lowercase())
}
