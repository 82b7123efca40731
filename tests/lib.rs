extern crate multiflip;

mod exporting;
mod maneuvers;
mod propagation;
