use crate::error::{GuardError, GuardResult};
use crate::stage::{GuardContext, GuardStage, Interaction};

/// The acting user must be registered.
pub struct ActorRegisteredStage;

impl GuardStage for ActorRegisteredStage {
    fn name(&self) -> &str {
        "actor-registered"
    }

    fn check(&self, interaction: &Interaction<'_>, ctx: &GuardContext<'_>) -> GuardResult<()> {
        let actor = interaction.actor();
        if ctx.graph.contains_user(actor) {
            Ok(())
        } else {
            Err(GuardError::UserNotFound(actor.into()))
        }
    }
}

/// The target post must exist.
///
/// Passes trivially for interactions without a target.
pub struct PostExistsStage;

impl GuardStage for PostExistsStage {
    fn name(&self) -> &str {
        "post-exists"
    }

    fn check(&self, interaction: &Interaction<'_>, ctx: &GuardContext<'_>) -> GuardResult<()> {
        match interaction.target() {
            Some(id) if ctx.post.is_none() => Err(GuardError::PostNotFound(id)),
            _ => Ok(()),
        }
    }
}
