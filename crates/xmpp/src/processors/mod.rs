mod debug;

pub use debug::DebugProcessor;
