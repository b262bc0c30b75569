//! Interactive chat session.
//!
//! Runs the read-eval loop: session commands are handled locally, anything
//! else goes to the backend. Assistant replies are scanned for a proposed
//! blockchain action, which is shown as a card and executed only after an
//! explicit confirmation.

use std::io::{self, Write};
use std::sync::Arc;

use neopay::prelude::*;

/// An interactive session against the assistant backend.
pub struct ChatSession {
    api: ApiClient,
    wallet: Arc<WalletAdapter>,
    executor: ActionExecutor,
    history: Vec<ChatTurn>,
    requests_made: Option<u64>,
    free_limit: Option<u64>,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("history_turns", &self.history.len())
            .finish_non_exhaustive()
    }
}

impl ChatSession {
    /// Create a session over a backend client and wallet.
    #[must_use]
    pub fn new(api: ApiClient, wallet: Arc<WalletAdapter>) -> Self {
        let executor = ActionExecutor::new(Arc::clone(&wallet));
        Self {
            api,
            wallet,
            executor,
            history: Vec::new(),
            requests_made: None,
            free_limit: None,
        }
    }

    /// Run the interactive loop, optionally sending an initial message.
    pub async fn run(&mut self, initial: Option<String>) -> anyhow::Result<()> {
        println!("Neo Pay assistant (type 'help' for commands, 'exit' to quit)");
        println!();

        if let Some(message) = initial {
            self.send(&message).await;
        }

        let stdin = io::stdin();
        let mut stdout = io::stdout();
        loop {
            print!("> ");
            stdout.flush().ok();

            let mut input = String::new();
            if stdin.read_line(&mut input).is_err() || input.is_empty() {
                break;
            }
            let input = input.trim();
            if input.is_empty() {
                continue;
            }

            match input {
                "exit" | "quit" => break,
                "clear" => {
                    self.history.clear();
                    println!("History cleared.");
                }
                "connect" => self.cmd_connect().await,
                "disconnect" => {
                    self.wallet.disconnect().await;
                    println!("Wallet disconnected.");
                }
                "balance" => self.cmd_balance().await,
                "status" => self.cmd_status().await,
                "help" => print_help(),
                _ => self.send(input).await,
            }
            println!();
        }

        Ok(())
    }

    async fn cmd_connect(&self) {
        match self.wallet.connect().await {
            Ok(state) => {
                let account = state
                    .account
                    .map(|a| a.to_checksum(None))
                    .unwrap_or_default();
                let network = state
                    .chain_id
                    .as_deref()
                    .map_or("unknown", networks::network_name);
                println!(
                    "Connected: {} on {network}",
                    networks::format_address(&account)
                );
            }
            Err(e) => println!("Could not connect: {e}"),
        }
    }

    async fn cmd_balance(&self) {
        match self.wallet.get_balance(None).await {
            Ok(balance) => println!("Balance: {balance} ETH"),
            Err(e) => println!("Could not fetch balance: {e}"),
        }
    }

    async fn cmd_status(&self) {
        match self.api.user_status().await {
            Ok(status) => print_status(&status),
            Err(e) => println!("Could not fetch status: {e}"),
        }
    }

    /// Send one user message, settling a legacy payment demand at most once.
    pub async fn send(&mut self, message: &str) {
        let mut paid = false;
        loop {
            match self.api.chat(message, &self.history).await {
                Ok(reply) => {
                    self.handle_reply(message, reply).await;
                    return;
                }
                Err(Error::Payment(PaymentError::LegacyPaymentRequired(request))) if !paid => {
                    paid = true;
                    if self.settle_legacy_payment(&request).await {
                        continue;
                    }
                    return;
                }
                Err(e) => {
                    println!("assistant: request failed ({e})");
                    return;
                }
            }
        }
    }

    async fn handle_reply(&mut self, message: &str, reply: ChatReply) {
        if let Some(settlement) = &reply.settlement {
            let tx = settlement.transaction.as_deref().unwrap_or("unknown");
            println!("[payment settled: {}]", networks::format_address(tx));
            // A settled payment opens a fresh usage window.
            self.requests_made = Some(0);
        }

        let response = reply.response;
        println!("assistant: {}", response.response);

        if let Some(made) = response.requests_made {
            self.requests_made = Some(made);
        }
        if let Some(limit) = response.free_limit {
            self.free_limit = Some(limit);
        }
        if let (Some(made), Some(limit)) = (self.requests_made, self.free_limit) {
            println!("[{made}/{limit} free requests used]");
        }

        self.history.push(ChatTurn::user(message));
        self.history
            .push(ChatTurn::assistant(response.response.clone()));

        if let Ok(action) = extract::extract_action(&response.response) {
            self.offer_action(&action).await;
        }
    }

    /// Show the action card and execute on confirmation.
    async fn offer_action(&self, action: &ActionDescriptor) {
        println!();
        println!("--- Proposed action ---");
        println!("{}", action.describe());
        if let Ok(pretty) = serde_json::to_string_pretty(action) {
            println!("{pretty}");
        }

        if !confirm("Execute this action? [y/N] ") {
            println!("Action skipped.");
            return;
        }

        let result = self.executor.execute(action).await;
        println!("{}", result.message);
        if let Some(tx_hash) = &result.tx_hash {
            if let Some(url) = self.explorer_link(tx_hash).await {
                println!("Explorer: {url}");
            }
        }
    }

    /// Run the pay-and-verify flow for a legacy payment demand.
    ///
    /// Returns true when the payment was confirmed on chain and verified by
    /// the server, meaning the original message can be retried.
    async fn settle_legacy_payment(&mut self, request: &LegacyPaymentRequest) -> bool {
        println!("The server requires a payment to continue: {request}");
        if let Some(instructions) = &request.instructions {
            println!("{instructions}");
        }
        if let Some(hours) = request.validity_hours {
            println!("A verified payment unlocks access for {hours}h.");
        }

        if !self.wallet.is_connected().await {
            println!("Please connect your wallet first");
            return false;
        }
        if !confirm("Pay now? [y/N] ") {
            println!("Payment skipped.");
            return false;
        }

        let to = match request.payment_address.parse() {
            Ok(address) => address,
            Err(e) => {
                println!("Bad payment address: {e}");
                return false;
            }
        };
        let hash = match self
            .wallet
            .send_native_transfer(to, request.amount_eth.as_str())
            .await
        {
            Ok(hash) => hash,
            Err(e) => {
                println!("Payment failed: {e}");
                return false;
            }
        };

        println!("Waiting for confirmation of {hash:#x}...");
        if let Err(e) = self.wallet.wait_for_confirmation(hash).await {
            println!("Payment not confirmed: {e}");
            return false;
        }

        let tx_hash = format!("{hash:#x}");
        match self.api.verify_payment(&tx_hash).await {
            Ok(()) => {
                println!("Payment verified.");
                self.requests_made = Some(0);
                true
            }
            Err(e) => {
                println!("Verification failed: {e}");
                false
            }
        }
    }

    async fn explorer_link(&self, tx_hash: &str) -> Option<String> {
        let chain_id = self.wallet.state().await.chain_id?;
        networks::explorer_tx_url(&chain_id, tx_hash)
    }
}

fn print_status(status: &UserStatus) {
    println!(
        "Requests used: {}/{} ({} remaining)",
        status.requests_made,
        status.free_limit,
        status.remaining()
    );
    if status.payment_required {
        match &status.payment_amount {
            Some(amount) => println!("Payment required: {amount} ETH"),
            None => println!("Payment required."),
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  connect      connect the wallet");
    println!("  disconnect   end the wallet session");
    println!("  balance      show the connected account balance");
    println!("  status       show backend usage quota");
    println!("  clear        reset conversation history");
    println!("  exit         quit");
    println!("Anything else is sent to the assistant.");
}

fn confirm(prompt: &str) -> bool {
    print!("{prompt}");
    io::stdout().flush().ok();
    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }
    matches!(input.trim(), "y" | "Y" | "yes")
}
