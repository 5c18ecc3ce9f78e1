use compost_logging::compost_trace;

use crate::{Effect, Msg, Phase, ReconcileState};

/// Pure update function: applies a message to the reconciler state and
/// returns the effects the session has to execute.
pub fn update(mut state: ReconcileState, msg: Msg) -> (ReconcileState, Vec<Effect>) {
    let effects = match msg {
        Msg::Started => {
            state.begin_pass();
            let mut effects = vec![Effect::RunPass];
            if state.polls_left() > 0 {
                effects.push(Effect::SchedulePoll {
                    delay: state.poll_interval(),
                });
            }
            effects
        }
        Msg::ContainerMutated => debounce(&mut state),
        Msg::PollTick => {
            if state.items_seen() || !state.consume_poll() {
                Vec::new()
            } else {
                let mut effects = debounce(&mut state);
                if state.polls_left() > 0 {
                    effects.push(Effect::SchedulePoll {
                        delay: state.poll_interval(),
                    });
                }
                effects
            }
        }
        Msg::DebounceElapsed { generation } => {
            if state.phase() == Phase::PendingDebounce && generation == state.generation() {
                state.begin_pass();
                vec![Effect::RunPass]
            } else {
                compost_trace!("stale debounce generation {generation} ignored");
                Vec::new()
            }
        }
        Msg::PassCompleted { items_found } => {
            if state.phase() != Phase::Reconciling {
                Vec::new()
            } else if items_found == 0 {
                state.set_phase(Phase::Idle);
                Vec::new()
            } else {
                state.mark_items_seen();
                state.set_phase(Phase::Suppressed);
                vec![
                    Effect::ScheduleRestore {
                        delay: state.timings().restore_delay,
                    },
                    Effect::ScheduleSettle {
                        delay: state.timings().settle,
                    },
                ]
            }
        }
        Msg::RestoreDue => {
            if state.phase() == Phase::Suppressed {
                vec![Effect::RunRestore]
            } else {
                Vec::new()
            }
        }
        Msg::SettleElapsed => {
            if state.phase() == Phase::Suppressed {
                state.set_phase(Phase::Idle);
            }
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn debounce(state: &mut ReconcileState) -> Vec<Effect> {
    match state.phase() {
        Phase::Idle | Phase::PendingDebounce => {
            let generation = state.arm_debounce();
            vec![Effect::ArmDebounce {
                generation,
                delay: state.timings().debounce,
            }]
        }
        // Mutations while a pass runs or settles are the pass's own.
        Phase::Reconciling | Phase::Suppressed => Vec::new(),
    }
}
