//! On/off outputs: lights, fans, relays

use super::{Action, DeviceBank, DeviceState, HandlerContext};
use crate::command::CommandResult;

/// Handle ON, OFF and TOGGLE
pub fn handle_switch(ctx: &HandlerContext, bank: &mut DeviceBank) -> CommandResult {
    // None means toggle
    let requested = match ctx.action {
        Action::On => Some(true),
        Action::Off => Some(false),
        Action::Toggle => None,
        Action::Lock | Action::Unlock => {
            return CommandResult::Rejected {
                message: format!("{} cannot {:?}", ctx.device, ctx.action),
            };
        }
    };

    let Some(DeviceState::Switch { on }) =
        bank.state_mut_if(&ctx.device, |s| matches!(s, DeviceState::Switch { .. }))
    else {
        return CommandResult::Rejected {
            message: format!("{} is a lock, not a switch", ctx.device),
        };
    };

    let target = requested.unwrap_or(!*on);

    let word = if target { "on" } else { "off" };
    if *on == target {
        return CommandResult::Completed {
            message: format!("{} already {}", ctx.device, word),
        };
    }

    *on = target;
    CommandResult::Completed {
        message: format!("{} switched {}", ctx.device, word),
    }
}
