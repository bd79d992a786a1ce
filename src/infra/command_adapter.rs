//! Lookup ports backed by external programs.
//!
//! The request is written to the program's stdin as one JSON document and the response
//! is read from its stdout. A non-zero exit, a timeout or unparseable output is a lookup
//! failure.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::app::ports::{
    AstrometricLookupPort, AstrometricSource, CatalogCrossMatchPort, CrossMatch, DustExtinctionPort,
    Extinction, MassCalibrationPort, MassInputs, SpectroscopicInputs, SpectroscopicParallaxPort,
};
use crate::config::CommandSpec;
use crate::domain::SkyPosition;

#[derive(Debug, Serialize)]
struct ConeRequest {
    ra_deg: f64,
    dec_deg: f64,
    radius_arcsec: f64,
}

#[derive(Debug, Serialize)]
struct DustRequest {
    ra_deg: f64,
    dec_deg: f64,
    radius_deg: f64,
}

#[derive(Debug, Deserialize)]
struct MassResponse {
    mass: f64,
    mass_err: f64,
}

#[derive(Debug, Deserialize)]
struct ParallaxResponse {
    parallax: f64,
    parallax_err: f64,
}

pub struct CommandAdapter {
    service: &'static str,
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandAdapter {
    pub fn new(service: &'static str, spec: &CommandSpec, timeout: Duration) -> Self {
        Self {
            service,
            program: spec.program.clone(),
            args: spec.args.clone(),
            timeout,
        }
    }

    async fn call<Req, Resp>(&self, request: &Req) -> Result<Resp, String>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let payload = serde_json::to_vec(request).map_err(|e| e.to_string())?;
        debug!("Calling {} ({}) with {} bytes", self.service, self.program, payload.len());

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("failed to start '{}': {}", self.program, e))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| "child stdin unavailable".to_string())?;

        let exchange = async move {
            stdin.write_all(&payload).await?;
            drop(stdin);
            child.wait_with_output().await
        };
        let output = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result.map_err(|e| format!("'{}' failed: {}", self.program, e))?,
            Err(_) => return Err(format!("'{}' timed out after {:?}", self.program, self.timeout)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            ));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| format!("bad response from '{}': {}", self.program, e))
    }
}

#[async_trait]
impl AstrometricLookupPort for CommandAdapter {
    async fn sources_near(
        &self,
        position: &SkyPosition,
        radius_arcsec: f64,
    ) -> Result<Vec<AstrometricSource>, String> {
        self.call(&ConeRequest {
            ra_deg: position.ra_deg(),
            dec_deg: position.dec_deg(),
            radius_arcsec,
        })
        .await
    }
}

#[async_trait]
impl CatalogCrossMatchPort for CommandAdapter {
    async fn cross_match(
        &self,
        position: &SkyPosition,
        radius_arcsec: f64,
    ) -> Result<Option<CrossMatch>, String> {
        self.call(&ConeRequest {
            ra_deg: position.ra_deg(),
            dec_deg: position.dec_deg(),
            radius_arcsec,
        })
        .await
    }
}

#[async_trait]
impl DustExtinctionPort for CommandAdapter {
    async fn extinction(&self, position: &SkyPosition, radius_deg: f64) -> Result<Extinction, String> {
        self.call(&DustRequest {
            ra_deg: position.ra_deg(),
            dec_deg: position.dec_deg(),
            radius_deg,
        })
        .await
    }
}

#[async_trait]
impl MassCalibrationPort for CommandAdapter {
    async fn mass(&self, inputs: &MassInputs) -> Result<(f64, f64), String> {
        let response: MassResponse = self.call(inputs).await?;
        Ok((response.mass, response.mass_err))
    }
}

#[async_trait]
impl SpectroscopicParallaxPort for CommandAdapter {
    async fn parallax(&self, inputs: &SpectroscopicInputs) -> Result<(f64, f64), String> {
        let response: ParallaxResponse = self.call(inputs).await?;
        Ok((response.parallax, response.parallax_err))
    }
}

/// Stand-in for a port with no program configured; every call fails.
pub struct UnboundPort {
    service: &'static str,
}

impl UnboundPort {
    pub fn new(service: &'static str) -> Self {
        Self { service }
    }

    fn failure(&self) -> String {
        format!("no command configured for {}", self.service)
    }
}

#[async_trait]
impl AstrometricLookupPort for UnboundPort {
    async fn sources_near(&self, _: &SkyPosition, _: f64) -> Result<Vec<AstrometricSource>, String> {
        Err(self.failure())
    }
}

#[async_trait]
impl CatalogCrossMatchPort for UnboundPort {
    async fn cross_match(&self, _: &SkyPosition, _: f64) -> Result<Option<CrossMatch>, String> {
        Err(self.failure())
    }
}

#[async_trait]
impl DustExtinctionPort for UnboundPort {
    async fn extinction(&self, _: &SkyPosition, _: f64) -> Result<Extinction, String> {
        Err(self.failure())
    }
}

#[async_trait]
impl MassCalibrationPort for UnboundPort {
    async fn mass(&self, _: &MassInputs) -> Result<(f64, f64), String> {
        Err(self.failure())
    }
}

#[async_trait]
impl SpectroscopicParallaxPort for UnboundPort {
    async fn parallax(&self, _: &SpectroscopicInputs) -> Result<(f64, f64), String> {
        Err(self.failure())
    }
}
