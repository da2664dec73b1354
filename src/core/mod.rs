//! Core data types: settings, layout, recipe and dependencies.

pub mod dependency;
pub mod layout;
pub mod recipe;
pub mod settings;
pub mod variables;

pub use dependency::{DependencySpec, Requirement};
pub use layout::{
    BuildFolderKey, BuildLayout, Dimension, InvalidFolderValueError, LayoutError,
    MissingSettingError,
};
pub use recipe::{find_recipe, Recipe, RecipeError, RecipeParseError};
pub use settings::{Setting, Settings, SettingsError};
pub use variables::{OverrideLint, RawVariables};
