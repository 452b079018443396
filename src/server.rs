use crate::errors::ServiceError;
use crate::protocol::{
    BalanceBody, LoginBody, MeBody, MessageBody, Op, RegisterBody, Request, Response,
    TransferBody, VerifyBody,
};
use crate::service::LedgerService;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

pub async fn run(
    bind: String,
    max_connections: usize,
    data_dir: PathBuf,
    secret: String,
    token_ttl: Duration,
) -> Result<()> {
    tracing::info!("Server mode: binding to {}", bind);

    let service = Arc::new(LedgerService::open(&data_dir, &secret, token_ttl));

    let listener = TcpListener::bind(&bind).await?;
    let semaphore = Arc::new(Semaphore::new(max_connections));

    tracing::info!("Listening on {}, max {} connections", bind, max_connections);

    loop {
        let permit = semaphore.clone().acquire_owned().await?;
        let (socket, addr) = listener.accept().await?;
        tracing::info!("Accepted connection from {}", addr);

        let service = service.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, service).await {
                tracing::error!("Connection {} error: {}", addr, e);
            }
            drop(permit);
        });
    }
}

async fn handle_connection(socket: TcpStream, service: Arc<LedgerService>) -> Result<()> {
    let (reader, writer) = socket.into_split();
    let mut lines = BufReader::new(reader).lines();
    let mut writer = BufWriter::new(writer);

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => dispatch(&service, request).await,
            Err(e) => {
                tracing::warn!("Malformed request: {}", e);
                Response::failure(&ServiceError::InvalidInput)
            }
        };

        let mut out = serde_json::to_vec(&response)?;
        out.push(b'\n');
        writer.write_all(&out).await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Route one request through the service and map the result onto a wire
/// response. Internal failures are logged here with their source and leave
/// the process as a bare 500.
pub async fn dispatch(service: &LedgerService, request: Request) -> Response {
    let token = request.token.as_deref();

    let result = match request.op {
        Op::Register {
            username,
            email,
            password,
        } => service
            .register(text(&username), text(&email), text(&password))
            .await
            .map(|registration| {
                Response::ok(
                    201,
                    RegisterBody {
                        message: "user and account created",
                        registration,
                    },
                )
            }),
        Op::Login { username, password } => service
            .login(text(&username), text(&password))
            .await
            .map(|session| {
                Response::ok(
                    200,
                    LoginBody {
                        message: "login successful",
                        session,
                    },
                )
            }),
        Op::Logout => service.logout(token).await.map(|()| {
            Response::ok(
                200,
                MessageBody {
                    message: "logout successful",
                },
            )
        }),
        Op::Me => service
            .me(token)
            .await
            .map(|user| Response::ok(200, MeBody { user })),
        Op::GetAccount { user_id } => service
            .account_for_user(token, text(&user_id))
            .await
            .map(|account| Response::ok(200, account)),
        Op::GetBalance { account_id } => service
            .balance(token, text(&account_id))
            .await
            .map(|balance| Response::ok(200, BalanceBody { balance })),
        Op::SetTransferPassword {
            account_number,
            transfer_password,
        } => service
            .set_transfer_password(token, text(&account_number), text(&transfer_password))
            .await
            .map(|()| {
                Response::ok(
                    200,
                    MessageBody {
                        message: "transfer password set",
                    },
                )
            }),
        Op::ChangeTransferPassword {
            account_number,
            old_transfer_password,
            new_transfer_password,
        } => service
            .change_transfer_password(
                token,
                text(&account_number),
                text(&old_transfer_password),
                text(&new_transfer_password),
            )
            .await
            .map(|()| {
                Response::ok(
                    200,
                    MessageBody {
                        message: "transfer password changed",
                    },
                )
            }),
        Op::VerifyTransferPassword {
            account_number,
            transfer_password,
        } => service
            .verify_transfer_password(token, text(&account_number), text(&transfer_password))
            .await
            .map(|valid| Response::ok(200, VerifyBody { valid })),
        Op::Transfer { request } => {
            service.transfer(token, &request).await.map(|outcome| {
                Response::ok(
                    200,
                    TransferBody {
                        message: "transfer completed",
                        outcome,
                    },
                )
            })
        }
    };

    match result {
        Ok(response) => response,
        Err(err) => {
            if let ServiceError::Internal(ref source) = err {
                tracing::error!(error = ?source, "Internal failure");
            }
            Response::failure(&err)
        }
    }
}

fn text(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or("")
}
