//! The unstable layer: extra members merged on top of a stable map.
//!
//! Merging only ever adds. A name that is already present fails the whole
//! merge, so stable members keep their values and descriptors.

use crate::builder::build_members;
use crate::context::Context;
use crate::descriptor::DescriptorMap;
use crate::error::Result;
use crate::surface::Surface;
use std::sync::Arc;
use tracing::debug;

/// Descriptor map for every unstable member of `surface`.
pub fn build_unstable(ctx: &Arc<Context>, surface: &Surface) -> Result<DescriptorMap> {
    let map = build_members(ctx, surface.unstable())?;
    debug!(members = map.len(), "built unstable surface");
    Ok(map)
}

/// `stable` plus the unstable members of `surface`.
pub fn merge_unstable(
    ctx: &Arc<Context>,
    stable: &DescriptorMap,
    surface: &Surface,
) -> Result<DescriptorMap> {
    let mut merged = stable.clone();
    merged.merge(build_unstable(ctx, surface)?)?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_stable;
    use crate::error::ShimError;
    use crate::members::tests::shared_context;
    use pretty_assertions::assert_eq;

    #[test]
    fn merge_keeps_stable_members() {
        let ctx = shared_context();
        let surface = Surface::bundled().unwrap();
        let stable = build_stable(&ctx, surface).unwrap();
        let merged = merge_unstable(&ctx, &stable, surface).unwrap();

        assert_eq!(merged.len(), surface.len());
        for (name, descriptor) in stable.iter() {
            assert_eq!(merged.get(name), Some(descriptor), "{name}");
        }
        assert!(merged.contains("umask"));
        assert!(!stable.contains("umask"));
    }

    #[test]
    fn unstable_names_may_not_shadow_stable_ones() {
        let ctx = shared_context();
        let stable = build_stable(&ctx, Surface::bundled().unwrap()).unwrap();
        let shadowing = Surface::from_toml_str(
            r#"
            runtime = "test"
            [unstable]
            pid = "number"
            "#,
        )
        .unwrap();
        assert!(matches!(
            merge_unstable(&ctx, &stable, &shadowing),
            Err(ShimError::Surface(_))
        ));
    }
}
