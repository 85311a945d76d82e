//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every innsyn endpoint, the probes and the error
//! bodies. Response schemas are collected from the handler annotations.
//! The document is served by Swagger UI in debug builds and printed by
//! `cargo run --bin openapi-dump`.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http::error::{FrontendErrorMessage, FrontendUnauthorizedMessage};

/// Adds the ID-porten bearer token scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "IdPorten",
            SecurityScheme::Http(
                Http::builder()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("ID-porten token, introspected through Texas."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "sosialhjelp-innsyn-api",
        description = "Innsyn in digital søknader om økonomisk sosialhjelp."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("IdPorten" = [])),
    paths(
        crate::inbound::http::saker::hent_alle_saker,
        crate::inbound::http::saker::hent_saks_detaljer,
        crate::inbound::http::saker::har_soknader_med_innsyn,
        crate::inbound::http::soknad::hent_soknads_status,
        crate::inbound::http::soknad::hent_saks_statuser,
        crate::inbound::http::soknad::hent_hendelser,
        crate::inbound::http::soknad::hent_hendelser_beta,
        crate::inbound::http::soknad::hent_forelopig_svar,
        crate::inbound::http::soknad::hent_kommune_info,
        crate::inbound::http::oppgaver::hent_oppgaver,
        crate::inbound::http::oppgaver::hent_oppgave_med_id,
        crate::inbound::http::oppgaver::hent_vilkar,
        crate::inbound::http::oppgaver::hent_dokumentasjonkrav,
        crate::inbound::http::oppgaver::hent_dokumentasjonkrav_med_id,
        crate::inbound::http::oppgaver::har_levert_dokumentasjonkrav,
        crate::inbound::http::oppgaver::fagsystem_har_dokumentasjonkrav,
        crate::inbound::http::vedlegg::hent_vedlegg,
        crate::inbound::http::vedlegg::send_vedlegg,
        crate::inbound::http::tilgang::har_tilgang,
        crate::inbound::http::utbetalinger::hent_utbetalinger,
        crate::inbound::http::utbetalinger::hent_nye_utbetalinger,
        crate::inbound::http::utbetalinger::hent_tidligere_utbetalinger,
        crate::inbound::http::utbetalinger::hent_utbetalinger_v2,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(FrontendErrorMessage, FrontendUnauthorizedMessage)),
    tags(
        (name = "saksoversikt", description = "Every søknad of the user"),
        (name = "soknad", description = "Status and history of one søknad"),
        (name = "oppgaver", description = "Oppgaver, vilkår and dokumentasjonkrav"),
        (name = "vedlegg", description = "Uploaded and new vedlegg"),
        (name = "utbetalinger", description = "Utbetalinger across saker"),
        (name = "tilgang", description = "Access check"),
        (name = "health", description = "NAIS probes")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the generated document.

    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    fn error_schema_uses_frontend_field_names() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error = schemas.get("FrontendErrorMessage").expect("error schema");

        assert_object_schema_has_field(error, "type");
        assert_object_schema_has_field(error, "message");
        let unauthorized = schemas
            .get("FrontendUnauthorizedMessage")
            .expect("unauthorized schema");
        assert_object_schema_has_field(unauthorized, "loginUrl");
    }

    #[rstest]
    #[case("/api/v1/innsyn/saker")]
    #[case("/api/v1/innsyn/harSoknaderMedInnsyn")]
    #[case("/api/v1/innsyn/{fiksDigisosId}/vedlegg")]
    #[case("/api/v1/innsyn/{fiksDigisosId}/dokumentasjonkrav/{dokumentasjonkravId}")]
    #[case("/api/v2/innsyn/utbetalinger")]
    #[case("/internal/isReady")]
    fn paths_are_registered(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing path {path}");
    }

    #[rstest]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("IdPorten"));
    }
}
