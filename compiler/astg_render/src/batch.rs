//! `batch.go`: one round-trip for many JSON-RPC calls.

use crate::context::RenderContext;
use crate::writer::GoFile;

pub fn batch_file(ctx: &RenderContext<'_>) -> GoFile {
    let mut file = GoFile::new(&ctx.config.package_name);
    let rpc = file.imports.add(&ctx.config.jsonrpc_import());
    file.imports.add("context");
    file.imports.add("fmt");
    file.imports.add("time");
    let observe = if ctx.has_metrics() { OBSERVE } else { "" };
    file.body.raw(
        &BATCH
            .replace("jsonrpc.", &format!("{rpc}."))
            .replace("\t$observe\n", observe),
    );
    file
}

/// Batched calls of instrumented contracts are observed one by one.
const OBSERVE: &str = "\tif request.service != \"\" {\n\t\tobserve(request.service, request.method, cli.clientID, err, begin)\n\t}\n";

const BATCH: &str = r#"type rpcCallback func(err error, response *jsonrpc.RPCResponse)

// RequestRPC is one call of a batch, built by the Req methods of the
// contract clients.
type RequestRPC struct {
	rpcRequest *jsonrpc.RPCRequest
	retHandler rpcCallback
	// service and method label instrumented calls.
	service string
	method  string
}

// Batch sends requests as one JSON-RPC array and hands each response to the
// callback of its request. A transport error reaches every callback; a
// request the server did not answer gets a missing-response error.
func (cli *Client) Batch(ctx context.Context, requests ...RequestRPC) {
	if len(requests) == 0 {
		return
	}
	begin := time.Now()
	pending := make(map[jsonrpc.ID]RequestRPC, len(requests))
	batch := make(jsonrpc.RPCRequests, 0, len(requests))
	for _, request := range requests {
		batch = append(batch, request.rpcRequest)
		pending[request.rpcRequest.ID] = request
	}
	responses, err := cli.rpc.CallBatch(ctx, batch)
	if err != nil {
		for _, request := range pending {
			cli.deliver(request, err, nil, begin)
		}
		return
	}
	for _, response := range responses {
		request, ok := pending[response.ID]
		if !ok {
			continue
		}
		delete(pending, response.ID)
		var responseErr error
		if response.Error != nil {
			responseErr = cli.rpc.ResponseError(response.Error)
		}
		cli.deliver(request, responseErr, response, begin)
	}
	for id, request := range pending {
		cli.deliver(request, fmt.Errorf("missing response for request id %v", id), nil, begin)
	}
}

func (cli *Client) deliver(request RequestRPC, err error, response *jsonrpc.RPCResponse, begin time.Time) {
	$observe
	if request.retHandler != nil {
		request.retHandler(err, response)
	}
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::testutil::project_with;
    use astg_tags::names;

    #[test]
    fn instrumented_batches_observe_each_request() {
        let mut project = project_with(&[]);
        let config = RenderConfig::new("/out/client", "example.com/app/client");
        let plain = batch_file(&RenderContext::new(&project, &config)).finish();
        assert!(!plain.contains("observe("));
        assert!(!plain.contains("$observe"));

        project.contracts[0].annotations.insert(names::METRICS, "");
        let text = batch_file(&RenderContext::new(&project, &config)).finish();
        assert!(text.contains(
            "begin time.Time) {\n\tif request.service != \"\" {\n\t\tobserve(request.service, request.method, cli.clientID, err, begin)\n\t}\n\tif request.retHandler != nil {"
        ));
        assert!(text.contains("cli.deliver(request, fmt.Errorf(\"missing response for request id %v\", id), nil, begin)"));
    }
}
