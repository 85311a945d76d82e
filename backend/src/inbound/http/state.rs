//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services and remain testable without I/O.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    DocumentEncryptor, DokumentlagerClient, FiksClient, KommuneInfoClient, NorgClient,
    PdfGenerator, PdfInspector, PdlClient, TokenIntrospector, VirusScanner,
};
use crate::domain::support::DokumentUrls;
use crate::domain::{
    EttersendelsePdfGenerator, EventService, FiksService, ForelopigSvarService, HendelseService,
    KommuneService, OppgaveService, SaksStatusService, SaksoversiktService,
    SoknadsStatusService, TilgangService, UtbetalingerService, VedleggOpplastingService,
    VedleggService,
};

/// Upstream ports the services are built from.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub fiks: Arc<dyn FiksClient>,
    pub dokumentlager: Arc<dyn DokumentlagerClient>,
    pub kommune_info: Arc<dyn KommuneInfoClient>,
    pub pdl: Arc<dyn PdlClient>,
    pub norg: Arc<dyn NorgClient>,
    pub virus_scanner: Arc<dyn VirusScanner>,
    pub encryptor: Arc<dyn DocumentEncryptor>,
    pub pdf_generator: Arc<dyn PdfGenerator>,
    pub pdf_inspector: Arc<dyn PdfInspector>,
    pub clock: Arc<dyn Clock>,
    pub urls: DokumentUrls,
    /// `navn;versjon` pairs of fagsystemer publishing vilkår.
    pub fagsystem_versjoner: Vec<String>,
    /// Log whether the newest sak has innsyn in papirsøknader.
    pub innsyn_i_papirsoknader: bool,
}

/// Domain services behind the innsyn endpoints.
#[derive(Clone)]
pub struct HttpStateServices {
    pub tilgang: TilgangService,
    pub saksoversikt: SaksoversiktService,
    pub soknads_status: SoknadsStatusService,
    pub saks_status: SaksStatusService,
    pub hendelse: HendelseService,
    pub oppgave: OppgaveService,
    pub forelopig_svar: ForelopigSvarService,
    pub kommune: KommuneService,
    pub vedlegg: VedleggService,
    pub vedlegg_opplasting: VedleggOpplastingService,
    pub utbetalinger: UtbetalingerService,
}

impl HttpStateServices {
    /// Wire every service over the given ports.
    pub fn from_ports(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            fiks,
            dokumentlager,
            kommune_info,
            pdl,
            norg,
            virus_scanner,
            encryptor,
            pdf_generator,
            pdf_inspector,
            clock,
            urls,
            fagsystem_versjoner,
            innsyn_i_papirsoknader,
        } = ports;

        let tilgang = TilgangService::new(pdl);
        let fiks = FiksService::new(fiks, tilgang.clone());
        let kommune = KommuneService::new(fiks.clone(), kommune_info, clock.clone());
        let event = EventService::new(
            fiks.clone(),
            kommune.clone(),
            norg,
            urls.clone(),
            clock.clone(),
        );
        let vedlegg = VedleggService::new(fiks.clone(), event.clone(), urls.clone());
        let vedlegg_opplasting = VedleggOpplastingService::new(
            fiks.clone(),
            dokumentlager,
            virus_scanner,
            encryptor,
            pdf_inspector,
            EttersendelsePdfGenerator::new(pdf_generator, clock.clone()),
        );

        let oppgave = OppgaveService::new(
            fiks.clone(),
            event.clone(),
            vedlegg.clone(),
            fagsystem_versjoner,
        );
        let mut saksoversikt = SaksoversiktService::new(
            fiks.clone(),
            event.clone(),
            vedlegg.clone(),
            kommune.clone(),
            clock.clone(),
        );
        if innsyn_i_papirsoknader {
            saksoversikt = saksoversikt.with_papirsoknad_logging(oppgave.clone());
        }

        Self {
            tilgang,
            saksoversikt,
            soknads_status: SoknadsStatusService::new(
                fiks.clone(),
                event.clone(),
                kommune.clone(),
                urls,
                clock.clone(),
            ),
            saks_status: SaksStatusService::new(fiks.clone(), event.clone()),
            hendelse: HendelseService::new(fiks.clone(), event.clone(), vedlegg.clone()),
            oppgave,
            forelopig_svar: ForelopigSvarService::new(fiks.clone(), event.clone()),
            kommune,
            vedlegg,
            vedlegg_opplasting,
            utbetalinger: UtbetalingerService::new(fiks, event, clock),
        }
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub introspector: Arc<dyn TokenIntrospector>,
    /// Returned in `401` bodies so the frontend can restart login.
    pub login_url: Option<String>,
    pub tilgang: TilgangService,
    pub saksoversikt: SaksoversiktService,
    pub soknads_status: SoknadsStatusService,
    pub saks_status: SaksStatusService,
    pub hendelse: HendelseService,
    pub oppgave: OppgaveService,
    pub forelopig_svar: ForelopigSvarService,
    pub kommune: KommuneService,
    pub vedlegg: VedleggService,
    pub vedlegg_opplasting: VedleggOpplastingService,
    pub utbetalinger: UtbetalingerService,
}

impl HttpState {
    /// Construct state from the token introspector and the service bundle.
    pub fn new(
        introspector: Arc<dyn TokenIntrospector>,
        login_url: Option<String>,
        services: HttpStateServices,
    ) -> Self {
        let HttpStateServices {
            tilgang,
            saksoversikt,
            soknads_status,
            saks_status,
            hendelse,
            oppgave,
            forelopig_svar,
            kommune,
            vedlegg,
            vedlegg_opplasting,
            utbetalinger,
        } = services;
        Self {
            introspector,
            login_url,
            tilgang,
            saksoversikt,
            soknads_status,
            saks_status,
            hendelse,
            oppgave,
            forelopig_svar,
            kommune,
            vedlegg,
            vedlegg_opplasting,
            utbetalinger,
        }
    }
}
