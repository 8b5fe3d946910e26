use crate::context::Context;
use crate::descriptor::DescriptorMap;
use crate::error::{Result, ShimError};
use crate::members::{self, stubs};
use crate::surface::{Member, Surface};
use crate::value::{Value, ValueKind};
use std::sync::Arc;
use tracing::{debug, warn};

/// Descriptor map for every stable member of `surface`.
pub fn build_stable(ctx: &Arc<Context>, surface: &Surface) -> Result<DescriptorMap> {
    let map = build_members(ctx, surface.stable())?;
    debug!(members = map.len(), runtime = surface.runtime(), "built stable surface");
    Ok(map)
}

pub(crate) fn build_members<'a>(
    ctx: &Arc<Context>,
    members: impl Iterator<Item = Member<'a>>,
) -> Result<DescriptorMap> {
    let mut map = DescriptorMap::new();
    for member in members {
        map.define(member.name, resolve_member(ctx, &member)?)?;
    }
    Ok(map)
}

/// The value bound for `member`. Its `typeof` must match the table.
fn resolve_member(ctx: &Arc<Context>, member: &Member<'_>) -> Result<Value> {
    match members::resolve(ctx, member.name) {
        Some(value) if value.kind() == member.kind => Ok(value),
        Some(value) => Err(ShimError::Surface(format!(
            "`{}` is declared as {} but implemented as {}",
            member.name,
            member.kind,
            value.kind()
        ))),
        None if member.kind == ValueKind::Function => {
            warn!(member = member.name, "no implementation, binding a not-implemented stub");
            Ok(stubs::not_implemented(member.name, member.name.to_owned()).into())
        }
        None => Err(ShimError::Surface(format!(
            "`{}` ({}) has no implementation",
            member.name, member.kind
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::members::tests::shared_context;
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    fn surface(stable: &str) -> Surface {
        Surface::from_toml_str(&format!("runtime = \"test\"\n[stable]\n{stable}")).unwrap()
    }

    #[test]
    fn bundled_stable_surface_builds() {
        let ctx = shared_context();
        let surface = Surface::bundled().unwrap();
        let map = build_stable(&ctx, surface).unwrap();
        assert_eq!(map.len(), surface.stable().count());
        for member in surface.stable() {
            let descriptor = map.get(member.name).unwrap();
            assert_eq!(descriptor.value().kind(), member.kind, "{}", member.name);
        }
    }

    #[test]
    #[traced_test]
    fn unknown_functions_become_stubs() {
        let ctx = shared_context();
        let map = build_stable(&ctx, &surface("brandNewOp = \"function\"")).unwrap();
        let stub = map.get("brandNewOp").unwrap().value().as_function().unwrap();
        assert_eq!(
            stub.call(&[]),
            Err(ShimError::NotImplemented("brandNewOp".to_owned()))
        );
        assert!(logs_contain("brandNewOp"));
    }

    #[test]
    fn unknown_values_are_contract_errors() {
        let ctx = shared_context();
        assert!(matches!(
            build_stable(&ctx, &surface("brandNewFlag = \"boolean\"")),
            Err(ShimError::Surface(_))
        ));
    }

    #[test]
    fn kind_mismatches_are_contract_errors() {
        let ctx = shared_context();
        let err = build_stable(&ctx, &surface("pid = \"function\"")).unwrap_err();
        assert_eq!(
            err,
            ShimError::Surface("`pid` is declared as function but implemented as number".to_owned())
        );
    }
}
