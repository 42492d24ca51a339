pub mod assets;
pub mod cameras;
pub mod handoff;
pub mod overlays;
pub mod render_take;
pub mod routes;
pub mod sequencer;
pub mod still;
pub mod templates;
