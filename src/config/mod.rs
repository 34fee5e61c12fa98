//! Configuration: tree options and declarative gadget layouts

mod schema;
mod store;

pub use schema::{
    BindingLayout, ConfigLayout, FunctionLayout, GadgetLayout, LoadPolicy, Options, WritePolicy,
};
pub use store::{load_layouts, load_options, parse_layouts};
