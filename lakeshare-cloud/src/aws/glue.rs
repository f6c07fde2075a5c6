//! Catalog databases, tables and resource links.

use super::AwsPolicyClient;
use super::errors::{build_error, has_code, remote_error};
use crate::error::CloudResult;
use crate::types::{AccountRef, ResourceLink};
use aws_sdk_glue::types::{DatabaseInput, TableIdentifier, TableInput};
use tracing::{debug, info};

const NOT_FOUND: &[&str] = &["EntityNotFoundException"];
const ALREADY_EXISTS: &[&str] = &["AlreadyExistsException"];

impl AwsPolicyClient {
    async fn glue(&self, account: &AccountRef) -> CloudResult<aws_sdk_glue::Client> {
        let config = self.sessions.sdk_config(account).await?;
        Ok(aws_sdk_glue::Client::new(&config))
    }

    pub(super) async fn glue_database_exists(
        &self,
        account: &AccountRef,
        database: &str,
    ) -> CloudResult<bool> {
        let client = self.glue(account).await?;
        match client
            .get_database()
            .catalog_id(&account.account_id)
            .name(database)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if has_code(&e, NOT_FOUND) => Ok(false),
            Err(e) => Err(remote_error("glue:GetDatabase", e)),
        }
    }

    pub(super) async fn glue_create_database(
        &self,
        account: &AccountRef,
        database: &str,
    ) -> CloudResult<()> {
        let client = self.glue(account).await?;
        let input = DatabaseInput::builder()
            .name(database)
            .description("Shared database managed by lakeshare")
            .build()
            .map_err(|e| build_error("glue:CreateDatabase", e))?;

        match client
            .create_database()
            .catalog_id(&account.account_id)
            .database_input(input)
            .send()
            .await
        {
            Ok(_) => {
                info!("created database {database} in {account}");
                Ok(())
            }
            Err(e) if has_code(&e, ALREADY_EXISTS) => Ok(()),
            Err(e) => Err(remote_error("glue:CreateDatabase", e)),
        }
    }

    pub(super) async fn glue_delete_database(
        &self,
        account: &AccountRef,
        database: &str,
    ) -> CloudResult<()> {
        let client = self.glue(account).await?;
        match client
            .delete_database()
            .catalog_id(&account.account_id)
            .name(database)
            .send()
            .await
        {
            Ok(_) => {
                info!("deleted database {database} in {account}");
                Ok(())
            }
            Err(e) if has_code(&e, NOT_FOUND) => Ok(()),
            Err(e) => Err(remote_error("glue:DeleteDatabase", e)),
        }
    }

    pub(super) async fn glue_table_exists(
        &self,
        account: &AccountRef,
        database: &str,
        table: &str,
    ) -> CloudResult<bool> {
        let client = self.glue(account).await?;
        match client
            .get_table()
            .catalog_id(&account.account_id)
            .database_name(database)
            .name(table)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if has_code(&e, NOT_FOUND) => {
                debug!("table {database}.{table} not found in {account}");
                Ok(false)
            }
            Err(e) => Err(remote_error("glue:GetTable", e)),
        }
    }

    pub(super) async fn glue_create_resource_link(
        &self,
        account: &AccountRef,
        link: &ResourceLink,
    ) -> CloudResult<()> {
        let client = self.glue(account).await?;
        let target = TableIdentifier::builder()
            .catalog_id(&link.target_catalog_id)
            .database_name(&link.target_database)
            .name(&link.target_table)
            .build();
        let input = TableInput::builder()
            .name(&link.name)
            .target_table(target)
            .build()
            .map_err(|e| build_error("glue:CreateTable", e))?;

        match client
            .create_table()
            .catalog_id(&account.account_id)
            .database_name(&link.database)
            .table_input(input)
            .send()
            .await
        {
            Ok(_) => {
                info!(
                    "created resource link {}.{} -> {}:{}.{}",
                    link.database,
                    link.name,
                    link.target_catalog_id,
                    link.target_database,
                    link.target_table
                );
                Ok(())
            }
            Err(e) if has_code(&e, ALREADY_EXISTS) => Ok(()),
            Err(e) => Err(remote_error("glue:CreateTable", e)),
        }
    }

    pub(super) async fn glue_delete_table(
        &self,
        account: &AccountRef,
        database: &str,
        table: &str,
    ) -> CloudResult<()> {
        let client = self.glue(account).await?;
        match client
            .delete_table()
            .catalog_id(&account.account_id)
            .database_name(database)
            .name(table)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if has_code(&e, NOT_FOUND) => Ok(()),
            Err(e) => Err(remote_error("glue:DeleteTable", e)),
        }
    }
}
