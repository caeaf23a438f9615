//! Post-typecheck pipeline
//!
//! Runs the expansion passes that follow type checking over a whole crate,
//! as selected by a [`DriverConfig`].

mod config;

pub use config::{DriverConfig, PassConfig};

use anyhow::{Context as _, Result, bail};
use rv_hir::Crate;
use rv_static_borrow::PassReport;
use std::path::Path;
use tracing::{debug, info};

/// What the pipeline did to a crate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Result of the static borrow pass, if it ran
    pub static_borrow: Option<PassReport>,
}

/// Configured post-typecheck pipeline
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: DriverConfig,
}

impl Pipeline {
    /// Pipeline using `config`
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    /// Pipeline configured from the TOML file at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    pub fn from_config_file(path: &Path) -> Result<Self> {
        Ok(Self::new(DriverConfig::load(path)?))
    }

    /// Active configuration
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Runs every enabled pass over `krate`
    ///
    /// # Errors
    ///
    /// Returns an error if a pass fails, or if idempotence checking is on
    /// and a second run of the static borrow pass still changes the crate.
    pub fn run(&self, krate: &mut Crate) -> Result<PipelineReport> {
        let mut report = PipelineReport::default();
        if !self.config.passes.static_borrow_constants {
            debug!("static borrow pass disabled");
            return Ok(report);
        }

        let first = rv_static_borrow::run(krate).context("static borrow pass failed")?;
        info!(
            promoted = first.promoted,
            statics = first.total_statics(),
            "promoted constant borrows"
        );

        if self.config.passes.verify_idempotent {
            let second = rv_static_borrow::run(krate).context("static borrow pass failed on re-run")?;
            if second.promoted != 0 {
                bail!(
                    "static borrow pass is not idempotent: {} borrows promoted on re-run",
                    second.promoted
                );
            }
            debug!("static borrow pass is idempotent");
        }

        report.static_borrow = Some(first);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rv_hir::{
        BorrowKind, CoreType, ExprKind, ExprNode, ExprPtr, Function, GenericParams, Linkage, Literal, Publicity,
        TypeRef, ValueItem,
    };
    use rv_intern::Interner;
    use rv_span::FileSpan;

    fn crate_with_borrow() -> Crate {
        let mut krate = Crate::new(Interner::new());
        let ty = TypeRef::Primitive(CoreType::U16);
        let value = ExprNode::boxed(ExprKind::Literal(Literal::Integer(7)), ty.clone(), FileSpan::generated());
        let ref_ty = TypeRef::new_borrow(BorrowKind::Shared, ty);
        let code = ExprPtr::new(ExprNode::new(
            ExprKind::Borrow {
                kind: BorrowKind::Shared,
                value,
            },
            ref_ty.clone(),
            FileSpan::generated(),
        ));
        let name = krate.interner.intern("seven");
        krate.root_module.add_value(
            name,
            Publicity::Public,
            ValueItem::Function(Function {
                params: GenericParams::default(),
                args: Vec::new(),
                ret: ref_ty,
                code: Some(code),
                linkage: Linkage::default(),
            }),
        );
        krate
    }

    #[test]
    fn test_default_pipeline_runs_pass() {
        let mut krate = crate_with_borrow();
        let report = Pipeline::default().run(&mut krate).unwrap();
        let pass = report.static_borrow.unwrap();
        assert_eq!(pass.promoted, 1);
        assert_eq!(pass.total_statics(), 1);
        assert_eq!(krate.root_module.value_items.len(), 2);
    }

    #[test]
    fn test_disabled_pass_leaves_crate_alone() {
        let mut krate = crate_with_borrow();
        let before = krate.root_module.clone();
        let config = DriverConfig::from_toml_str("[passes]\nstatic_borrow_constants = false").unwrap();

        let report = Pipeline::new(config).run(&mut krate).unwrap();
        assert!(report.static_borrow.is_none());
        assert_eq!(krate.root_module, before);
    }

    #[test]
    fn test_idempotence_check_passes() {
        let mut krate = crate_with_borrow();
        let config = DriverConfig::from_toml_str("[passes]\nverify_idempotent = true").unwrap();

        let report = Pipeline::new(config).run(&mut krate).unwrap();
        assert_eq!(report.static_borrow.map(|pass| pass.promoted), Some(1));
        assert_eq!(krate.root_module.value_items.len(), 2);
    }
}
