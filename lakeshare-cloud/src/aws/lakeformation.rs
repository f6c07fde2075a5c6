//! Catalog permission grants.

use super::AwsPolicyClient;
use super::errors::{build_error, has_code, remote_error};
use crate::error::CloudResult;
use crate::types::{AccountRef, LfPermission, LfResource, PermissionGrant};
use aws_sdk_lakeformation::types::{
    DataLakePrincipal, DatabaseResource, Permission, Resource, TableResource,
};
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use tracing::{debug, info};

fn permissions(perms: &[LfPermission]) -> Vec<Permission> {
    perms.iter().map(|p| Permission::from(p.as_str())).collect()
}

fn resource(operation: &str, resource: &LfResource) -> CloudResult<Resource> {
    let built = match resource {
        LfResource::Database { catalog_id, name } => Resource::builder()
            .database(
                DatabaseResource::builder()
                    .catalog_id(catalog_id)
                    .name(name)
                    .build()
                    .map_err(|e| build_error(operation, e))?,
            )
            .build(),
        LfResource::Table {
            catalog_id,
            database,
            name,
        } => Resource::builder()
            .table(
                TableResource::builder()
                    .catalog_id(catalog_id)
                    .database_name(database)
                    .name(name)
                    .build()
                    .map_err(|e| build_error(operation, e))?,
            )
            .build(),
    };
    Ok(built)
}

fn principal(identifier: &str) -> DataLakePrincipal {
    DataLakePrincipal::builder()
        .data_lake_principal_identifier(identifier)
        .build()
}

impl AwsPolicyClient {
    async fn lakeformation(
        &self,
        account: &AccountRef,
    ) -> CloudResult<aws_sdk_lakeformation::Client> {
        let config = self.sessions.sdk_config(account).await?;
        Ok(aws_sdk_lakeformation::Client::new(&config))
    }

    pub(super) async fn lf_grant(
        &self,
        account: &AccountRef,
        grant: &PermissionGrant,
    ) -> CloudResult<()> {
        const OP: &str = "lakeformation:GrantPermissions";
        let client = self.lakeformation(account).await?;
        let mut request = client
            .grant_permissions()
            .catalog_id(&account.account_id)
            .principal(principal(&grant.principal))
            .resource(resource(OP, &grant.resource)?)
            .set_permissions(Some(permissions(&grant.permissions)));
        if !grant.grantable.is_empty() {
            request = request.set_permissions_with_grant_option(Some(permissions(&grant.grantable)));
        }

        request.send().await.map_err(|e| remote_error(OP, e))?;
        info!(
            "granted {:?} on {} to {}",
            grant.permissions, grant.resource, grant.principal
        );
        Ok(())
    }

    pub(super) async fn lf_revoke(
        &self,
        account: &AccountRef,
        grant: &PermissionGrant,
    ) -> CloudResult<()> {
        const OP: &str = "lakeformation:RevokePermissions";
        let client = self.lakeformation(account).await?;
        let mut request = client
            .revoke_permissions()
            .catalog_id(&account.account_id)
            .principal(principal(&grant.principal))
            .resource(resource(OP, &grant.resource)?)
            .set_permissions(Some(permissions(&grant.permissions)));
        if !grant.grantable.is_empty() {
            request = request.set_permissions_with_grant_option(Some(permissions(&grant.grantable)));
        }

        match request.send().await {
            Ok(_) => {
                info!(
                    "revoked {:?} on {} from {}",
                    grant.permissions, grant.resource, grant.principal
                );
                Ok(())
            }
            Err(e) if has_code(&e, &["EntityNotFoundException"]) => {
                debug!("nothing to revoke on {}, resource is gone", grant.resource);
                Ok(())
            }
            Err(e)
                if has_code(&e, &["InvalidInputException"])
                    && e.message().is_some_and(|m| m.contains("No permissions revoked")) =>
            {
                debug!("no permissions held by {} on {}", grant.principal, grant.resource);
                Ok(())
            }
            Err(e) => Err(remote_error(OP, e)),
        }
    }
}
