//! Door locks

use super::{Action, DeviceBank, DeviceState, HandlerContext};
use crate::command::CommandResult;

/// Handle LOCK and UNLOCK (and their OPEN/CLOSE aliases)
pub fn handle_lock(ctx: &HandlerContext, bank: &mut DeviceBank) -> CommandResult {
    let target = match ctx.action {
        Action::Lock => true,
        Action::Unlock => false,
        Action::On | Action::Off | Action::Toggle => {
            return CommandResult::Rejected {
                message: format!("{} cannot {:?}", ctx.device, ctx.action),
            };
        }
    };

    let Some(DeviceState::Lock { locked }) =
        bank.state_mut_if(&ctx.device, |s| matches!(s, DeviceState::Lock { .. }))
    else {
        return CommandResult::Rejected {
            message: format!("{} is not a lock", ctx.device),
        };
    };

    let word = if target { "locked" } else { "unlocked" };
    if *locked == target {
        return CommandResult::Completed {
            message: format!("{} already {}", ctx.device, word),
        };
    }

    *locked = target;
    CommandResult::Completed {
        message: format!("{} {}", ctx.device, word),
    }
}
