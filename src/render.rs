//! # Module Dispatch
//!
//! Routes each classified module to the render routine registered for its
//! variant. Dispatch never fails: invalid modules, gated modules the viewer
//! may not see, and routines that error are all turned into a
//! [`Rendered::Skip`], so one bad module cannot break its page.

use crate::auth::AuthStatus;
use crate::classify::{classify, Classification, InvalidReason};
use crate::module::{ModuleId, RawModule, VariantTag};
use crate::VariantRenderer;
use handlebars::html_escape;
use log::{debug, warn};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Per-page settings that decide how skips are surfaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchContext {
    /// Authentication status, captured once for the whole page.
    pub auth: AuthStatus,
    /// Render a visible placeholder instead of dropping failed modules.
    pub diagnostics: bool,
    /// Where anonymous viewers of gated modules are sent to sign in.
    pub login_url: Option<String>,
}

impl DispatchContext {
    /// A production context for the given authentication status.
    pub fn new(auth: AuthStatus) -> Self {
        Self {
            auth,
            diagnostics: false,
            login_url: None,
        }
    }
}

impl Default for DispatchContext {
    fn default() -> Self {
        Self::new(AuthStatus::Anonymous)
    }
}

/// What a rendered module holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// The module's own presentation.
    Module,
    /// A sign-in prompt standing in for a gated module.
    LoginPrompt,
    /// A development placeholder for a module that was skipped.
    Diagnostic,
}

/// The presentation fragment of one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedModule {
    /// The module's id, when it has one.
    pub id: Option<ModuleId>,
    /// The variant rendered, when the module classified.
    pub tag: Option<VariantTag>,
    /// Rendered HTML.
    pub html: String,
    /// What the fragment is.
    pub kind: OutputKind,
}

/// Why a module produced no output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The module did not classify as a known variant.
    Invalid(InvalidReason),
    /// The module is gated and authentication is still being determined.
    AwaitingAuth,
    /// The module is gated and the viewer is not signed in.
    Unauthenticated,
    /// The variant's routine failed.
    RoutineFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Invalid(reason) => write!(f, "{}", reason),
            SkipReason::AwaitingAuth => {
                f.write_str("authentication is still being determined")
            }
            SkipReason::Unauthenticated => {
                f.write_str("module requires a signed-in viewer")
            }
            SkipReason::RoutineFailed(message) => {
                write!(f, "render routine failed: {}", message)
            }
        }
    }
}

/// The result of dispatching one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// The module produced a fragment.
    Output(RenderedModule),
    /// The module produced nothing.
    Skip(SkipReason),
}

impl Rendered {
    /// Returns the fragment, dropping skips.
    pub fn into_output(self) -> Option<RenderedModule> {
        match self {
            Rendered::Output(module) => Some(module),
            Rendered::Skip(_) => None,
        }
    }
}

/// A total table of render routines, one per variant.
///
/// Every [`VariantTag`] has a routine from construction on, so a valid
/// module always finds one.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    routines: HashMap<VariantTag, Arc<dyn VariantRenderer>>,
    prompt: Arc<dyn VariantRenderer>,
}

impl Dispatcher {
    /// Creates a dispatcher that sends every variant to `routine`.
    ///
    /// `routine` also renders sign-in prompts.
    pub fn new(routine: Arc<dyn VariantRenderer>) -> Self {
        let routines = VariantTag::ALL
            .into_iter()
            .map(|tag| (tag, Arc::clone(&routine)))
            .collect();
        Self {
            routines,
            prompt: routine,
        }
    }

    /// Replaces the routine of a single variant.
    pub fn with_routine(
        mut self,
        tag: VariantTag,
        routine: Arc<dyn VariantRenderer>,
    ) -> Self {
        _ = self.routines.insert(tag, routine);
        self
    }

    /// Dispatches one module.
    ///
    /// Gating is checked before classification, so a gated module that
    /// the viewer cannot see is never rendered, valid or not.
    pub fn dispatch(
        &self,
        module: &RawModule,
        context: &DispatchContext,
    ) -> Rendered {
        if module.is_gated() {
            match context.auth {
                AuthStatus::Authenticated => {}
                AuthStatus::Determining => {
                    debug!(
                        "Holding gated module {} until authentication resolves",
                        module.id_label()
                    );
                    return Rendered::Skip(SkipReason::AwaitingAuth);
                }
                AuthStatus::Anonymous => {
                    return self.login_prompt(module, context);
                }
            }
        }

        let variant = match classify(module) {
            Classification::Valid(variant) => variant,
            Classification::Invalid(reason) => {
                warn!("Skipping module {}: {}", module.id_label(), reason);
                return self.skipped(
                    module,
                    None,
                    SkipReason::Invalid(reason),
                    context,
                );
            }
        };

        let tag = variant.tag();
        let Some(routine) = self.routines.get(&tag) else {
            return self.skipped(
                module,
                Some(tag),
                SkipReason::RoutineFailed(format!("no routine for `{}`", tag)),
                context,
            );
        };

        match routine.render(module, &variant) {
            Ok(html) => Rendered::Output(RenderedModule {
                id: module.id(),
                tag: Some(tag),
                html,
                kind: OutputKind::Module,
            }),
            Err(e) => {
                warn!(
                    "Render routine for `{}` module {} failed: {}",
                    tag,
                    module.id_label(),
                    e
                );
                self.skipped(
                    module,
                    Some(tag),
                    SkipReason::RoutineFailed(e.to_string()),
                    context,
                )
            }
        }
    }

    fn login_prompt(
        &self,
        module: &RawModule,
        context: &DispatchContext,
    ) -> Rendered {
        let Some(login_url) = context.login_url.as_deref() else {
            debug!("Hiding gated module {} from anonymous viewer", module.id_label());
            return Rendered::Skip(SkipReason::Unauthenticated);
        };

        match self.prompt.render_login_prompt(module, login_url) {
            Ok(html) => Rendered::Output(RenderedModule {
                id: module.id(),
                tag: None,
                html,
                kind: OutputKind::LoginPrompt,
            }),
            Err(e) => {
                warn!(
                    "Sign-in prompt for module {} failed: {}",
                    module.id_label(),
                    e
                );
                Rendered::Skip(SkipReason::Unauthenticated)
            }
        }
    }

    fn skipped(
        &self,
        module: &RawModule,
        tag: Option<VariantTag>,
        reason: SkipReason,
        context: &DispatchContext,
    ) -> Rendered {
        if !context.diagnostics {
            return Rendered::Skip(reason);
        }
        Rendered::Output(RenderedModule {
            id: module.id(),
            tag,
            html: diagnostic_html(module, &reason),
            kind: OutputKind::Diagnostic,
        })
    }
}

fn diagnostic_html(module: &RawModule, reason: &SkipReason) -> String {
    let declared = module.type_name().unwrap_or("untyped");
    format!(
        "<div class=\"module-diagnostic\" role=\"note\"><strong>Module {} ({}) was not rendered.</strong> <span>{}</span></div>",
        html_escape(&module.id_label()),
        html_escape(declared),
        html_escape(&reason.to_string()),
    )
}
