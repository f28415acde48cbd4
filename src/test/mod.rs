mod engine;
mod rate;
