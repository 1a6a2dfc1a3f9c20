mod alert_events;
mod alert_rules;
mod channels;
mod machines;
mod operators;
mod samples;

pub use alert_events::AlertEventRepository;
pub use alert_rules::AlertRuleRepository;
pub use channels::ChannelRepository;
pub use machines::MachineRepository;
pub use operators::OperatorRepository;
pub use samples::SampleRepository;
