// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::time::Duration;

use anyhow::Result;
use azstore_azure_storage::{
    Config, EnvCredentialProvider, Executor, LinearRetry, LocationMode, OperationContext,
    OperationEvent, OperationListener, RequestOptions, RequestSigner, Service,
    AZURE_STORAGE_CONNECTION_STRING,
};
use azstore_core::{Context, OsEnv, Signer, StaticEnv};
use azstore_http_send_reqwest::ReqwestHttpSend;
use bytes::Bytes;

/// Prints every attempt as it happens.
struct PrintAttempts;

impl OperationListener for PrintAttempts {
    fn on_event(&self, event: &OperationEvent<'_>) {
        match event {
            OperationEvent::ResponseReceived(r) => {
                println!("  {} answered {}", r.target_location, r.status_code)
            }
            OperationEvent::Retrying { info, .. } => println!(
                "  retrying on {} in {:?}",
                info.target_location(),
                info.retry_interval()
            ),
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let _ = dotenv::dotenv();

    let mut ctx = Context::new().with_http_send(ReqwestHttpSend::default());
    ctx = if std::env::var("AZURE_STORAGE_ACCOUNT_NAME").is_ok()
        || std::env::var(AZURE_STORAGE_CONNECTION_STRING).is_ok()
    {
        ctx.with_env(OsEnv)
    } else {
        println!("no AZURE_STORAGE_* env found, using the local emulator");
        ctx.with_env(StaticEnv {
            envs: [(
                AZURE_STORAGE_CONNECTION_STRING.to_string(),
                "UseDevelopmentStorage=true".to_string(),
            )]
            .into(),
        })
    };

    let config = Config::new(Service::Blob).from_env(&ctx)?;
    let uri = config
        .storage_uri()?
        .join("test?restype=container&comp=list")?;
    println!("listing {}", uri.primary());

    let executor = Executor::new(Signer::new(
        ctx,
        EnvCredentialProvider::new(),
        RequestSigner::new(),
    ));
    let options = RequestOptions::default()
        .with_location_mode(LocationMode::PrimaryThenSecondary)
        .with_retry_policy(LinearRetry::new(Duration::from_secs(3), 2))
        .with_maximum_execution_time(Duration::from_secs(60));
    let mut op = OperationContext::new().with_listener(PrintAttempts);

    match executor
        .execute(
            |uri| Ok(http::Request::get(uri.clone()).body(Bytes::new())?),
            &uri,
            &options,
            &mut op,
        )
        .await
    {
        Ok(resp) => println!("listed container: {}", resp.status()),
        Err(err) => println!("listing failed: {err}"),
    }
    println!(
        "operation {} made {} attempts",
        op.client_request_id(),
        op.request_results().len()
    );

    Ok(())
}
