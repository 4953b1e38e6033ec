use agora_types::VoteValue;

use crate::error::{GuardError, GuardResult};
use crate::stage::{GuardContext, GuardStage, Interaction};

/// Title and body must fit the store's configured limits.
pub struct ContentLengthStage;

impl GuardStage for ContentLengthStage {
    fn name(&self) -> &str {
        "content-length"
    }

    fn check(&self, interaction: &Interaction<'_>, ctx: &GuardContext<'_>) -> GuardResult<()> {
        let Interaction::CreatePost { title, body, .. } = *interaction else {
            return Ok(());
        };
        let limits = ctx.content.limits();

        let len = title.chars().count();
        if len > limits.max_title_len {
            return Err(GuardError::TitleTooLong {
                len,
                max: limits.max_title_len,
            });
        }
        let len = body.chars().count();
        if len > limits.max_content_len {
            return Err(GuardError::ContentTooLong {
                len,
                max: limits.max_content_len,
            });
        }
        Ok(())
    }
}

/// A vote must be exactly +1 or -1.
pub struct VoteValueStage;

impl GuardStage for VoteValueStage {
    fn name(&self) -> &str {
        "vote-value"
    }

    fn check(&self, interaction: &Interaction<'_>, _ctx: &GuardContext<'_>) -> GuardResult<()> {
        match *interaction {
            Interaction::RatePost { value, .. } => VoteValue::try_from(value)
                .map(|_| ())
                .map_err(|_| GuardError::InvalidVoteValue(value)),
            _ => Ok(()),
        }
    }
}
