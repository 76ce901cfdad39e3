//! `metrics.go` and `version.go`.
//!
//! Instrumented client methods defer `observe`, which feeds the request
//! counters and the latency histogram.

use crate::context::RenderContext;
use crate::writer::{quote, GoFile};

/// Prometheus client library imported by the generated metrics.
pub const PROMETHEUS: &str = "github.com/prometheus/client_golang/prometheus";

pub fn metrics_file(ctx: &RenderContext<'_>) -> GoFile {
    let mut file = GoFile::new(&ctx.config.package_name);
    for path in ["errors", "strconv", "time", PROMETHEUS] {
        file.imports.add(path);
    }
    let subsystem = quote(&ctx.config.package_name);
    file.body
        .raw(&METRICS.replace("\"$subsystem\"", &subsystem));
    if ctx.has_json_rpc() {
        let rpc = file.imports.add(&ctx.config.jsonrpc_import());
        file.body.raw(&RPC_CODE.replace("jsonrpc.", &format!("{rpc}.")));
    } else {
        file.body.raw(PLAIN_CODE);
    }
    file
}

/// `VersionASTg`: the generator version the client was built with.
pub fn version_file(ctx: &RenderContext<'_>) -> GoFile {
    let version = if ctx.config.version.is_empty() {
        &ctx.project.version
    } else {
        &ctx.config.version
    };
    let mut file = GoFile::new(&ctx.config.package_name);
    file.body
        .line(format!("const VersionASTg = {}", quote(version)));
    file
}

const METRICS: &str = r#"var labels = []string{"service", "method", "success", "errCode", "client_id"}

var (
	// VersionGauge is set to 1 for the generator version of this client.
	VersionGauge = prometheus.NewGaugeVec(prometheus.GaugeOpts{
		Namespace: "astg",
		Subsystem: "$subsystem",
		Name:      "versions",
		Help:      "Versions of the generated client",
	}, []string{"part", "version"})
	// RequestCount counts calls answered without error.
	RequestCount = prometheus.NewCounterVec(prometheus.CounterOpts{
		Namespace: "astg",
		Subsystem: "$subsystem",
		Name:      "requests_count",
		Help:      "Requests answered without error",
	}, []string{"service", "method", "client_id"})
	// RequestCountAll counts every call, by outcome and error code.
	RequestCountAll = prometheus.NewCounterVec(prometheus.CounterOpts{
		Namespace: "astg",
		Subsystem: "$subsystem",
		Name:      "requests_all_count",
		Help:      "Requests issued, by outcome",
	}, labels)
	RequestLatency = prometheus.NewHistogramVec(prometheus.HistogramOpts{
		Namespace: "astg",
		Subsystem: "$subsystem",
		Name:      "requests_latency_seconds",
		Help:      "Request latency",
		Buckets:   prometheus.DefBuckets,
	}, labels)
)

func init() {
	prometheus.MustRegister(VersionGauge, RequestCount, RequestCountAll, RequestLatency)
	VersionGauge.WithLabelValues("astg", VersionASTg).Set(1)
}

func observe(service, method, clientID string, err error, begin time.Time) {
	success := strconv.FormatBool(err == nil)
	code := strconv.Itoa(errorCode(err))
	RequestCountAll.WithLabelValues(service, method, success, code, clientID).Inc()
	if err == nil {
		RequestCount.WithLabelValues(service, method, clientID).Inc()
	}
	RequestLatency.WithLabelValues(service, method, success, code, clientID).Observe(time.Since(begin).Seconds())
}
"#;

const RPC_CODE: &str = r#"
func errorCode(err error) int {
	if err == nil {
		return 0
	}
	var rpcErr *jsonrpc.RPCError
	if errors.As(err, &rpcErr) {
		return rpcErr.Code
	}
	var coded interface{ Code() int }
	if errors.As(err, &coded) {
		return coded.Code()
	}
	return -1
}
"#;

const PLAIN_CODE: &str = r#"
func errorCode(err error) int {
	if err == nil {
		return 0
	}
	var coded interface{ Code() int }
	if errors.As(err, &coded) {
		return coded.Code()
	}
	return -1
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::testutil::project_with;
    use pretty_assertions::assert_eq;

    #[test]
    fn version_prefers_the_configured_value() {
        let project = project_with(&[]);
        let mut config = RenderConfig::new("/out/client", "example.com/app/client");
        let ctx = RenderContext::new(&project, &config);
        assert!(version_file(&ctx).finish().ends_with("const VersionASTg = \"1.2.3\"\n"));

        config.version = "v2.0.0".to_string();
        let ctx = RenderContext::new(&project, &config);
        assert_eq!(
            version_file(&ctx).finish(),
            "// Code generated by astg. DO NOT EDIT.\n\npackage client\n\nconst VersionASTg = \"v2.0.0\"\n"
        );
    }

    #[test]
    fn metrics_name_the_subsystem_and_decode_rpc_codes() {
        let project = project_with(&[]);
        let config = RenderConfig::new("/out/client", "example.com/app/client");
        let ctx = RenderContext::new(&project, &config);
        let text = metrics_file(&ctx).finish();
        assert!(text.contains("Subsystem: \"client\","));
        assert!(text.contains("Name:      \"requests_all_count\","));
        assert!(text.contains("var rpcErr *jsonrpc.RPCError"));
        assert!(text.contains("\"example.com/app/client/jsonrpc\""));
        assert!(text.contains("\"github.com/prometheus/client_golang/prometheus\""));
    }

    #[test]
    fn success_counter_only_counts_clean_calls() {
        let project = project_with(&[]);
        let config = RenderConfig::new("/out/client", "example.com/app/client");
        let text = metrics_file(&RenderContext::new(&project, &config)).finish();
        assert!(text.contains("}, []string{\"service\", \"method\", \"client_id\"})"));
        assert!(text.contains(
            "\tRequestCountAll.WithLabelValues(service, method, success, code, clientID).Inc()\n\tif err == nil {\n\t\tRequestCount.WithLabelValues(service, method, clientID).Inc()\n\t}"
        ));
    }
}
