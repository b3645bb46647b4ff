// src/app/run.rs
use crate::cert::{
    self, CaHierarchy, CaRole, CryptoBackend, OutputDir, WorkspaceDir,
};
use crate::config::GeneratorConfig;
use crate::error::{BootstrapError, Result};
use crate::kubeconfig::{BundleBuilder, BUNDLE_IDENTITIES};
use crate::paths::PkiLayout;
use crate::topology::Topology;
use crate::utils::logging::Logger;

/// Progress of one bootstrap run. Strictly forward; `Failed` is terminal
/// from any state and skips cleanup so partial artifacts stay inspectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    RootsCreated,
    ServiceAccountKeyCreated,
    LeafCertsCreated,
    BundlesAssembled,
    Cleaned,
    Failed,
}

/// Drives the whole pipeline: workspace layout, root CAs, service-account
/// keys, the leaf catalog, access bundles, cleanup.
pub struct BootstrapRun {
    config: GeneratorConfig,
    topology: Topology,
    layout: PkiLayout,
    backend: Box<dyn CryptoBackend>,
    logger: Box<dyn Logger>,
    show: bool,
    state: RunState,
}

impl BootstrapRun {
    pub fn new(
        config: GeneratorConfig,
        topology: Topology,
        backend: Box<dyn CryptoBackend>,
        logger: Box<dyn Logger>,
        show: bool,
    ) -> Self {
        let layout = PkiLayout::new(config.root_dir.clone());
        Self {
            config,
            topology,
            layout,
            backend,
            logger,
            show,
            state: RunState::Init,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn execute(&mut self) -> Result<()> {
        match self.run_pipeline() {
            Ok(()) => Ok(()),
            Err(e) => {
                self.state = RunState::Failed;
                self.logger.log(&format!("Bootstrap failed: {}", e));
                Err(e)
            }
        }
    }

    fn run_pipeline(&mut self) -> Result<()> {
        self.logger.log(&format!(
            "Bootstrapping PKI under {}",
            self.layout.root().display()
        ));
        self.layout.ensure()?;

        let cas = CaHierarchy::new(&self.layout);
        cas.create_roots(
            self.backend.as_mut(),
            self.config.validity_days,
            self.logger.as_mut(),
        )?;
        if self.show {
            for ca in cas.roots() {
                let text = self.backend.inspect(&ca.cert_path(), self.logger.as_mut())?;
                self.logger.log(&text);
            }
        }
        self.state = RunState::RootsCreated;

        cert::generate_service_account_keys(
            self.backend.as_mut(),
            &self.layout,
            self.logger.as_mut(),
        )?;
        self.state = RunState::ServiceAccountKeyCreated;

        // Leaf generation must not start without an advertise address: an
        // empty topology would otherwise yield a degenerate apiserver
        // certificate and bundles pointing nowhere.
        if !self.topology.has_masters() || self.topology.internal_advertise().is_none() {
            return Err(BootstrapError::NoAdvertiseAddress);
        }

        let generated = cert::run_catalog(
            self.backend.as_mut(),
            &self.topology,
            &cas,
            &self.config.subject,
            self.config.validity_days,
            &self.layout,
            self.show,
            self.logger.as_mut(),
        )?;
        self.logger
            .log(&format!("Generated {} leaf certificates", generated.len()));
        self.state = RunState::LeafCertsCreated;

        self.assemble_bundles(&cas)?;
        self.state = RunState::BundlesAssembled;

        self.logger.log("Cleaning up ephemeral workspace");
        self.layout.cleanup_workspace()?;
        self.state = RunState::Cleaned;
        self.logger.log("Bootstrap complete");
        Ok(())
    }

    fn assemble_bundles(&mut self, cas: &CaHierarchy) -> Result<()> {
        let advertise = self
            .topology
            .internal_advertise()
            .ok_or(BootstrapError::NoAdvertiseAddress)?
            .to_string();

        for identity in &BUNDLE_IDENTITIES {
            let spec = cert::request::spec_for(identity.role, &self.topology)?;
            // Bundle client material only ever lives embedded in the conf
            // file, so it is generated straight into the workspace.
            let generated = cert::generate_leaf(
                self.backend.as_mut(),
                &spec,
                cas,
                &self.config.subject,
                self.config.validity_days,
                &OutputDir::Workspace.resolve(&self.layout),
                &WorkspaceDir::Root.resolve(&self.layout),
                self.logger.as_mut(),
            )?;

            let root_ca = cas.require(CaRole::Kubernetes)?;
            let bundle = BundleBuilder::new(&advertise, root_ca).build(
                &spec.common_name,
                &generated,
                &self.layout.bundle_path(identity.conf_name),
                self.logger.as_mut(),
            )?;
            self.logger.log(&format!(
                "Identity {} ready at {}",
                bundle.identity,
                bundle.path.display()
            ));
        }
        Ok(())
    }
}
