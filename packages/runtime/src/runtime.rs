//! The dispatcher.
//!
//! A dispatch takes a tree, a message and a target path, and produces a new
//! tree. The input tree is never touched: the root is cloned and every node
//! on the way down to the target is unshared with `Arc::make_mut`, so
//! untouched subtrees stay shared between the old and the new tree while
//! anything that changes lives only in the new one.

use std::collections::VecDeque;
use std::sync::Arc;

use reducible_state::{Envelope, Message, StateMap};

use crate::component::{ComponentDef, Reduction};
use crate::effect::{Effect, EffectContext};
use crate::error::{DispatchError, Result};
use crate::registry::{self, Registry};
use crate::render::Renderer;
use crate::trace::Trace;

/// Ceiling on effect-produced messages per dispatch.
pub const DEFAULT_MAX_EFFECT_STEPS: usize = 8;

/// Tunables for a [`Runtime`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// How many follow-up messages effects may produce in one dispatch.
    pub max_effect_steps: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_effect_steps: DEFAULT_MAX_EFFECT_STEPS,
        }
    }
}

/// The new tree together with what happened while producing it.
#[derive(Debug)]
pub struct Dispatched {
    pub envelope: Envelope,
    pub trace: Trace,
}

/// Routes messages into envelope trees and drains the effects they cause.
///
/// A `Runtime` holds no per-dispatch state, so one instance can serve any
/// number of concurrent dispatches.
#[derive(Clone, Debug)]
pub struct Runtime {
    registry: Arc<Registry>,
    config: RuntimeConfig,
}

impl Runtime {
    pub fn new(registry: Arc<Registry>, config: RuntimeConfig) -> Self {
        Self { registry, config }
    }

    /// A runtime over the process-wide registry.
    pub fn from_global(config: RuntimeConfig) -> Result<Self> {
        Ok(Self::new(registry::global()?, config))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// A fresh single-node tree for a registered component.
    pub fn initial_envelope(&self, component_id: &str, path: &str) -> Result<Envelope> {
        let def = self.registry.get(component_id)?;
        Ok(Envelope::initial(def.id(), def.schema(), path))
    }

    /// Apply `message` to the node at `target` and return the new tree.
    pub fn dispatch(
        &self,
        envelope: &Envelope,
        message: Message,
        target: &str,
        ctx: &EffectContext,
    ) -> Result<Envelope> {
        self.dispatch_traced(envelope, message, target, ctx)
            .map(|dispatched| dispatched.envelope)
    }

    /// Like [`Runtime::dispatch`], also returning the trace of every
    /// reduction performed.
    pub fn dispatch_traced(
        &self,
        envelope: &Envelope,
        message: Message,
        target: &str,
        ctx: &EffectContext,
    ) -> Result<Dispatched> {
        let span = tracing::debug_span!("dispatch", path = %target, kind = %message.kind());
        let _guard = span.enter();

        let mut working = envelope.clone();
        let trace = self.dispatch_at(&mut working, message, target, ctx)?;
        tracing::debug!(
            steps = trace.steps.len(),
            chain = ?trace.chain(),
            "dispatch complete"
        );

        Ok(Dispatched {
            envelope: working,
            trace,
        })
    }

    /// Render the whole tree.
    pub fn render_root(&self, envelope: &Envelope, renderer: &dyn Renderer) -> Result<String> {
        Ok(renderer.render(&envelope.component_id, envelope)?)
    }

    /// Render only the node at `target`.
    pub fn render_target(
        &self,
        envelope: &Envelope,
        target: &str,
        renderer: &dyn Renderer,
    ) -> Result<String> {
        let node = envelope.find(target).ok_or_else(|| DispatchError::UnknownPath {
            path: target.to_string(),
        })?;
        Ok(renderer.render(&node.component_id, node)?)
    }

    fn dispatch_at(
        &self,
        node: &mut Envelope,
        message: Message,
        target: &str,
        ctx: &EffectContext,
    ) -> Result<Trace> {
        if !node.is_supported_version() {
            return Err(DispatchError::UnsupportedVersion(node.schema_version));
        }
        if node.path == target {
            return self.reduce_node(node, message, ctx);
        }

        let unknown = || DispatchError::UnknownPath {
            path: target.to_string(),
        };
        let key = node.next_hop(target).ok_or_else(unknown)?.to_string();
        let child = node.child_mut(&key).ok_or_else(unknown)?;
        self.dispatch_at(child, message, target, ctx)
    }

    fn reduce_node(&self, node: &mut Envelope, message: Message, ctx: &EffectContext) -> Result<Trace> {
        let def = self.registry.get(&node.component_id)?;
        let hydrated = def.schema().build(Some(&node.data));
        let mut trace = Trace::new(&node.path, def.id(), hydrated.clone());

        let mut queue: VecDeque<Effect> = self.apply(def, node, hydrated, &message, &mut trace)?.into();
        let mut steps = 0usize;

        while let Some(effect) = queue.pop_front() {
            let follow_up = effect
                .invoke(ctx, node)
                .map_err(|e| DispatchError::EffectContractViolation {
                    component: def.id().to_string(),
                    path: node.path.clone(),
                    message: e.to_string(),
                })?;

            let Some(next) = follow_up else {
                continue;
            };

            steps += 1;
            if steps > self.config.max_effect_steps {
                tracing::warn!(
                    component = def.id(),
                    path = %node.path,
                    limit = self.config.max_effect_steps,
                    "effect budget exceeded"
                );
                return Err(DispatchError::EffectBudgetExceeded {
                    component: def.id().to_string(),
                    path: node.path.clone(),
                    limit: self.config.max_effect_steps,
                });
            }

            // Reduced data is already schema-built.
            let current = node.data.clone();
            queue.extend(self.apply(def, node, current, &next, &mut trace)?);
        }

        Ok(trace)
    }

    /// One reduction of the built state `before`: write the next state into
    /// `node` and record it.
    fn apply(
        &self,
        def: &dyn ComponentDef,
        node: &mut Envelope,
        before: StateMap,
        message: &Message,
        trace: &mut Trace,
    ) -> Result<Vec<Effect>> {
        let Reduction { data, effects } = def.reduce_built(before.clone(), message)?;
        trace.record(message.kind(), message.payload(), &before, &data);
        tracing::trace!(
            component = def.id(),
            kind = message.kind(),
            effects = effects.len(),
            "reduced"
        );
        node.data = data;
        Ok(effects)
    }
}
