// Voice management, modulation routing and dynamics control.
// This layer sits above the graph nodes and owns everything that sounds.

pub mod arbiter;
pub mod engine;
pub mod headroom;
pub mod limiter;
pub mod manager;
pub mod message;
pub mod modulation;
pub mod params;
pub mod voice;

pub use engine::{Engine, EngineConfig, FrameReport};
pub use message::{MessageReceiver, SynthMessage};
pub use params::{ParamChange, Params};
