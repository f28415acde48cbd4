pub mod demo;
pub mod model;
pub mod rng;
pub mod scenario;
pub mod sim;

#[cfg(test)]
mod test;
