//! Deferred inference actions and the fixed-point sweep that drains them.

use std::collections::VecDeque;

use yangkit_core::{QName, SchemaNodeIdentifier};

use super::Phase;
use super::namespace::NamespaceKind;
use crate::stmt::StmtId;

/// Something an action waits for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prerequisite {
    /// `key` resolves in `kind` as seen from `from`, and the target reached `phase`.
    Namespace {
        kind: NamespaceKind,
        from: StmtId,
        key: QName,
        phase: Phase,
    },
    /// The statement reached `phase`.
    Statement { id: StmtId, phase: Phase },
    /// The schema node exists. Relative identifiers start at `from`.
    SchemaNode {
        from: StmtId,
        path: SchemaNodeIdentifier,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    /// The target does not exist (yet).
    Missing,
    /// The target exists but has not reached the required phase.
    Blocked,
}

/// A prerequisite that was not met when the queue stalled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unmet {
    pub prerequisite: Prerequisite,
    pub readiness: Readiness,
}

pub trait PrerequisiteCheck {
    fn check(&self, prerequisite: &Prerequisite) -> Readiness;
}

type Apply<C> = Box<dyn FnOnce(&mut C)>;
type OnFailure<C> = Box<dyn FnOnce(&mut C, &[Unmet])>;

pub struct InferenceAction<C> {
    label: String,
    prerequisites: Vec<Prerequisite>,
    apply: Apply<C>,
    on_failure: OnFailure<C>,
}

impl<C> InferenceAction<C> {
    pub fn new(
        label: impl Into<String>,
        prerequisites: Vec<Prerequisite>,
        apply: impl FnOnce(&mut C) + 'static,
        on_failure: impl FnOnce(&mut C, &[Unmet]) + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            prerequisites,
            apply: Box::new(apply),
            on_failure: Box::new(on_failure),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<C> std::fmt::Debug for InferenceAction<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceAction")
            .field("label", &self.label)
            .field("prerequisites", &self.prerequisites)
            .finish_non_exhaustive()
    }
}

/// Pending actions of one phase, in enqueue order.
pub struct ActionQueue<C> {
    actions: VecDeque<InferenceAction<C>>,
}

impl<C> Default for ActionQueue<C> {
    fn default() -> Self {
        Self {
            actions: VecDeque::new(),
        }
    }
}

impl<C: PrerequisiteCheck> ActionQueue<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: InferenceAction<C>) {
        self.actions.push_back(action);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Sweep until the queue drains or a full sweep applies nothing.
    ///
    /// On a stall every remaining action's failure hook fires: actions with a missing
    /// prerequisite first, then the merely blocked ones, each group in queue order.
    /// Returns `true` if the queue drained.
    pub fn run(mut self, ctx: &mut C) -> bool {
        let mut sweeps = 0usize;
        while !self.actions.is_empty() {
            sweeps += 1;
            let mut applied = 0usize;
            for _ in 0..self.actions.len() {
                let Some(action) = self.actions.pop_front() else {
                    break;
                };
                let ready = action
                    .prerequisites
                    .iter()
                    .all(|p| ctx.check(p) == Readiness::Ready);
                if ready {
                    log::trace!("applying {}", action.label);
                    (action.apply)(ctx);
                    applied += 1;
                } else {
                    self.actions.push_back(action);
                }
            }
            log::trace!(
                "sweep {sweeps}: applied {applied}, {} pending",
                self.actions.len()
            );
            if applied == 0 {
                self.stall(ctx);
                return false;
            }
        }
        true
    }

    fn stall(self, ctx: &mut C) {
        log::debug!("inference stalled with {} pending actions", self.actions.len());
        let (missing, blocked): (Vec<_>, Vec<_>) = self
            .actions
            .into_iter()
            .map(|action| {
                let unmet: Vec<Unmet> = action
                    .prerequisites
                    .iter()
                    .filter_map(|p| match ctx.check(p) {
                        Readiness::Ready => None,
                        readiness => Some(Unmet {
                            prerequisite: p.clone(),
                            readiness,
                        }),
                    })
                    .collect();
                (action, unmet)
            })
            .partition(|(_, unmet)| unmet.iter().any(|u| u.readiness == Readiness::Missing));

        for (action, unmet) in missing.into_iter().chain(blocked) {
            log::debug!("unresolved: {}", action.label);
            (action.on_failure)(ctx, &unmet);
        }
    }
}
