//! Command implementations

pub mod build;
pub mod clean;
pub mod completions;
pub mod deps;
pub mod export;
pub mod install;
pub mod layout;

use anyhow::{bail, Result};

use crate::cli::{ProviderArgs, SettingsArgs};
use berth::core::{RawVariables, Recipe};
use berth::ops::{
    resolve_settings, select_provider, OrchestrateError, PlanOptions, ProviderOptions, RunPlan,
    SettingsOptions,
};
use berth::sources::DependencyProvider;
use berth::util::config::{load_config, Config};
use berth::util::context::project_berth_dir;
use berth::util::GlobalContext;

/// The recipe and configuration a command works on.
pub struct Session {
    pub recipe: Recipe,
    pub config: Config,
}

impl Session {
    /// Find the recipe from the working directory and load the merged config.
    pub fn load() -> Result<Self> {
        let ctx = GlobalContext::new()?;
        let recipe_path = ctx.find_recipe().map_err(OrchestrateError::from)?;
        let recipe = Recipe::load(&recipe_path)?;

        let project_config = project_berth_dir(recipe.recipe_dir()).join("config.toml");
        let config = load_config(&ctx.config_path(), &project_config);

        Ok(Session { recipe, config })
    }

    /// Resolve settings and layout into a run plan.
    pub fn plan(
        self,
        args: &SettingsArgs,
        defines: &[String],
        generator: Option<String>,
    ) -> Result<RunPlan> {
        let settings = resolve_settings(
            &self.recipe,
            &self.config,
            &SettingsOptions {
                assignments: args.settings.clone(),
                profile: args.profile.clone(),
                detect: !args.no_detect,
            },
        )?;

        let opts = PlanOptions {
            build_root: args
                .build_root
                .clone()
                .or_else(|| self.config.build.build_root.clone()),
            defines: parse_defines(defines)?,
            generator: generator.or_else(|| self.config.build.generator.clone()),
        };

        Ok(RunPlan::new(self.recipe, settings, &opts)?)
    }

    /// The dependency provider chosen by flags and config.
    pub fn provider(&self, args: &ProviderArgs) -> Result<Box<dyn DependencyProvider>> {
        select_provider(
            &self.config.deps,
            &ProviderOptions {
                provider: args.provider.clone(),
                prefix: args.dep_prefix.clone(),
            },
        )
    }
}

fn parse_defines(defines: &[String]) -> Result<RawVariables> {
    let mut vars = RawVariables::new();
    for define in defines {
        let Some((key, value)) = RawVariables::parse_define(define) else {
            bail!("invalid --define `{}`: expected KEY=VALUE", define);
        };
        vars.insert(key, value);
    }
    Ok(vars)
}
