use structopt::StructOpt;
use thiserror::Error;
use tracing::{debug, error};

use lather_util::Key;
use lather_wsdl::{self as wsdl, ReqwestHttp, Wsdl};

mod logging;
mod request;

use request::{Param, Request};

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    WsdlError(#[from] wsdl::Error),

    #[error("Invalid parameter {0:?}, expected key=value")]
    InvalidParam(String),

    #[error("Unable to initialise logging")]
    LoggingError(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

#[derive(StructOpt)]
struct Args {
    /// Log filter used when RUST_LOG is not set
    #[structopt(short, long, default_value = "warn")]
    log_level: String,

    /// WSDL URL, file path, or the document itself
    wsdl: String,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
enum Command {
    /// Lists services and their ports
    Services,

    /// Lists the operations of a port
    Operations { service: String, port: String },

    /// Shows the endpoint and binding details of an operation
    Operation {
        service: String,
        port: String,
        operation: String,
    },

    /// Prints the HTTP request for an operation
    Request {
        service: String,
        port: String,
        operation: String,

        /// Body parameter; snake_case keys are sent as lowerCamelCase
        #[structopt(short, long = "param")]
        params: Vec<Param>,

        /// Body parameter whose key is sent as written
        #[structopt(short, long = "raw")]
        raw: Vec<Param>,
    },
}

#[paw::main]
fn main(args: Args) -> Result<(), Error> {
    logging::init(&args.log_level)?;

    run(args).map_err(|err| {
        error!("{}", err);
        err
    })
}

fn run(args: Args) -> Result<(), Error> {
    let wsdl = Wsdl::new(&args.wsdl, ReqwestHttp::new())?;
    debug!(
        documents = wsdl.documents().len(),
        schemas = wsdl.schemas().len(),
        "loaded WSDL"
    );

    match args.command {
        Command::Services => {
            for (service_name, service) in wsdl.services().iter() {
                println!("{}", service_name);

                for (port_name, port) in service.ports.iter() {
                    println!("  {} ({}) {}", port_name, port.ty, port.location);
                }
            }
        }

        Command::Operations { service, port } => {
            for operation in wsdl.operations(&service, &port)? {
                println!("{}", operation);
            }
        }

        Command::Operation {
            service,
            port,
            operation,
        } => {
            let operation = wsdl.operation(&service, &port, &operation)?;

            println!("name:        {}", operation.name());
            println!("endpoint:    {}", operation.endpoint());
            println!("soap action: {}", operation.soap_action().unwrap_or("-"));
            println!("version:     {:?}", operation.soap_version());
            println!("input:       {}", operation.input_style());
            println!("output:      {}", operation.output_style());

            for part in operation.input_parts()? {
                let reference = part.element.as_ref().or(part.ty.as_ref());
                match reference {
                    Some(reference) => println!("part:        {} ({})", part.name, reference),
                    None => println!("part:        {}", part.name),
                }
            }
        }

        Command::Request {
            service,
            port,
            operation,
            params,
            raw,
        } => {
            let operation = wsdl.operation(&service, &port, &operation)?;

            let params = params
                .into_iter()
                .map(|param| (Key::symbol(param.key), param.value))
                .chain(raw.into_iter().map(|param| (Key::literal(param.key), param.value)))
                .collect::<Vec<_>>();

            print!("{}", Request::build(&operation, request::body(&params)));
            println!();
        }
    }

    Ok(())
}
