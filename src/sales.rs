//! Sale register: the cart controller for one in-progress sale.
//!
//! Owns the working cart, the product selection fields and the submit
//! action. All interactive questions (confirm / prompt / alert) go through
//! [`Dialogs`]; the only outbound call is the finalize request.
//!
//! **Submit action:** `Idle -> Submitting -> Idle`. The transition back to
//! `Idle` happens on every outcome (success, rejection, transport failure).
//! There is no retry and no request de-duplication; a second `finalize`
//! while `Submitting` is ignored.

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::api::SalesBackend;
use crate::cart::Cart;
use crate::catalog::{Catalog, Product};
use crate::dialogs::{Dialogs, Notification};
use crate::error::{ApiError, RegisterError};
use crate::models::SaleReceipt;
use crate::money::format_brl;
use crate::view::{CartView, LineView, ReceiptView, SearchEntryView, SearchPanel, SubmitState};

const MSG_ITEM_REMOVED: &str = "Item removido da venda";
const MSG_INVALID_QUANTITY: &str = "Quantidade deve ser um número válido maior que 0";
const MSG_CONNECTION_ERROR: &str = "Erro de conexão ao finalizar venda";
const MSG_SALE_DONE: &str = "Venda finalizada com sucesso";

/// Outcome of [`SaleRegister::finalize`].
#[derive(Debug, Clone, PartialEq)]
pub enum FinalizeOutcome {
    EmptyCart,
    Declined,
    AlreadySubmitting,
    Completed(SaleReceipt),
    Failed(String),
}

/// Leading integer of `raw`, the way a browser's `parseInt` reads a field:
/// surrounding whitespace and trailing garbage are ignored.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

fn positive_quantity(raw: &str) -> Option<u32> {
    parse_leading_int(raw)
        .filter(|n| *n > 0)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
}

pub struct SaleRegister<B, D> {
    backend: Arc<B>,
    dialogs: Arc<D>,
    session_id: Uuid,
    catalog: Catalog,
    cart: Cart,
    search_term: String,
    results_visible: bool,
    active: Option<Product>,
    quantity_input: String,
    just_added: bool,
    submit: SubmitState,
    receipt: Option<SaleReceipt>,
}

impl<B: SalesBackend, D: Dialogs> SaleRegister<B, D> {
    pub fn new(backend: Arc<B>, dialogs: Arc<D>, catalog: Catalog) -> Self {
        let session_id = Uuid::new_v4();
        info!(session = %session_id, products = catalog.len(), "Sale register opened");
        Self {
            backend,
            dialogs,
            session_id,
            catalog,
            cart: Cart::new(),
            search_term: String::new(),
            results_visible: false,
            active: None,
            quantity_input: String::new(),
            just_added: false,
            submit: SubmitState::Idle,
            receipt: None,
        }
    }

    /// Page load: read the catalog embedded in the register page once.
    pub async fn open(backend: Arc<B>, dialogs: Arc<D>) -> Result<Self, ApiError> {
        let catalog = backend.fetch_catalog().await?;
        Ok(Self::new(backend, dialogs, catalog))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn active_product(&self) -> Option<&Product> {
        self.active.as_ref()
    }

    pub fn submit_state(&self) -> SubmitState {
        self.submit
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Record a keystroke in the search field and return the result panel.
    pub fn search(&mut self, term: &str) -> Option<SearchPanel> {
        self.just_added = false;
        self.search_term = term.to_string();
        self.results_visible = !term.trim().is_empty();
        self.search_panel()
    }

    /// Hide the result panel without touching the term (click outside).
    pub fn dismiss_results(&mut self) {
        self.results_visible = false;
    }

    pub fn select(&mut self, product_id: i64) -> Result<(), RegisterError> {
        let product = self
            .catalog
            .get(product_id)
            .cloned()
            .ok_or(RegisterError::UnknownProduct(product_id))?;
        debug!(product_id, name = %product.name, "Product selected");
        self.search_term = product.name.clone();
        self.results_visible = false;
        self.active = Some(product);
        self.quantity_input.clear();
        self.just_added = false;
        Ok(())
    }

    /// Record the raw quantity field. Returns whether adding is now allowed.
    pub fn set_quantity(&mut self, raw: &str) -> bool {
        self.just_added = false;
        self.quantity_input = raw.to_string();
        self.add_enabled()
    }

    /// Drop the active product and reset the entry fields (Escape).
    pub fn clear_selection(&mut self) {
        self.active = None;
        self.search_term.clear();
        self.quantity_input.clear();
        self.results_visible = false;
    }

    fn add_enabled(&self) -> bool {
        self.active.is_some() && positive_quantity(&self.quantity_input).is_some()
    }

    fn pending_subtotal(&self) -> String {
        match (&self.active, positive_quantity(&self.quantity_input)) {
            (Some(product), Some(quantity)) => {
                format_brl(product.price * rust_decimal::Decimal::from(quantity))
            }
            _ => String::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Cart mutations
    // -----------------------------------------------------------------------

    /// Merge the active selection into the cart. No-op without a product or a
    /// valid quantity.
    pub fn add_line(&mut self) -> bool {
        let Some(product) = self.active.clone() else {
            return false;
        };
        let Some(quantity) = positive_quantity(&self.quantity_input) else {
            return false;
        };

        self.cart.add(&product, quantity);
        debug!(
            session = %self.session_id,
            product_id = product.id,
            quantity,
            lines = self.cart.len(),
            "Line added"
        );
        self.clear_selection();
        self.just_added = true;
        true
    }

    /// Ask for a replacement quantity for line `index`.
    pub async fn edit_quantity(&mut self, index: usize) -> Result<(), RegisterError> {
        self.just_added = false;
        let line = self
            .cart
            .line(index)
            .ok_or(RegisterError::NoSuchLine(index))?;
        let name = line.product.name.clone();
        let current = line.quantity().to_string();

        let Some(answer) = self
            .dialogs
            .prompt(&format!("Nova quantidade para \"{name}\":"), &current)
            .await
        else {
            return Ok(());
        };

        match parse_leading_int(&answer) {
            Some(n) if n > 0 => {
                let quantity = u32::try_from(n).unwrap_or(u32::MAX);
                self.cart.set_quantity(index, quantity);
                self.dialogs
                    .notify(Notification::success("Quantidade atualizada"));
            }
            Some(0) => {
                let question =
                    format!("Quantidade 0 informada. Deseja remover \"{name}\" da venda?");
                if self.dialogs.confirm(&question).await {
                    self.cart.remove(index);
                    self.dialogs.notify(Notification::warning(MSG_ITEM_REMOVED));
                }
            }
            _ => self.dialogs.alert(MSG_INVALID_QUANTITY).await,
        }
        Ok(())
    }

    /// Remove line `index` after confirmation. Returns whether it was removed.
    pub async fn remove_line(&mut self, index: usize) -> Result<bool, RegisterError> {
        self.just_added = false;
        let name = self
            .cart
            .line(index)
            .map(|l| l.product.name.clone())
            .ok_or(RegisterError::NoSuchLine(index))?;

        if !self
            .dialogs
            .confirm(&format!("Deseja remover \"{name}\" da venda?"))
            .await
        {
            return Ok(false);
        }
        self.cart.remove(index);
        self.dialogs.notify(Notification::warning(MSG_ITEM_REMOVED));
        Ok(true)
    }

    /// Empty the cart after confirmation. Returns whether it was cleared.
    pub async fn clear_cart(&mut self) -> bool {
        self.just_added = false;
        if self.cart.is_empty() {
            self.dialogs
                .notify(Notification::info("Não há itens para remover"));
            return false;
        }

        let question = format!(
            "Deseja limpar toda a venda?\n\nItens: {}\nTotal: {}\n\nEsta ação não pode ser desfeita.",
            self.cart.len(),
            format_brl(self.cart.total())
        );
        if !self.dialogs.confirm(&question).await {
            return false;
        }

        self.cart.clear();
        self.clear_selection();
        self.dialogs
            .notify(Notification::success("Venda limpa com sucesso"));
        true
    }

    // -----------------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------------

    /// Confirm and submit the cart.
    ///
    /// The exclusive borrow held across the request is what disables the
    /// submit trigger for a host: no other register call, `view()` included,
    /// can run until the outcome is in. `Submitting` is still tracked so a
    /// re-entrant caller gets [`FinalizeOutcome::AlreadySubmitting`].
    pub async fn finalize(&mut self) -> FinalizeOutcome {
        if self.submit == SubmitState::Submitting {
            return FinalizeOutcome::AlreadySubmitting;
        }
        self.just_added = false;
        if self.cart.is_empty() {
            self.dialogs.notify(Notification::warning(
                "Adicione pelo menos um produto à venda",
            ));
            return FinalizeOutcome::EmptyCart;
        }

        let total = self.cart.total();
        let question = format!(
            "Finalizar venda?\n\nItens: {}\nTotal: {}\n\nEsta ação não pode ser desfeita.",
            self.cart.len(),
            format_brl(total)
        );
        if !self.dialogs.confirm(&question).await {
            return FinalizeOutcome::Declined;
        }

        self.submit = SubmitState::Submitting;
        let request = self.cart.to_sale_request();
        info!(
            session = %self.session_id,
            items = request.items.len(),
            total = %total,
            "Submitting sale"
        );
        let result = self.backend.finalize_sale(&request).await;
        self.submit = SubmitState::Idle;

        match result {
            Ok(receipt) => {
                info!(
                    session = %self.session_id,
                    sale_id = receipt.sale_id,
                    total = %receipt.total,
                    "Sale finalized"
                );
                let message = if receipt.message.trim().is_empty() {
                    MSG_SALE_DONE.to_string()
                } else {
                    receipt.message.clone()
                };
                self.dialogs.notify(Notification::success(message));
                self.receipt = Some(receipt.clone());
                self.cart.clear();
                self.clear_selection();
                FinalizeOutcome::Completed(receipt)
            }
            Err(ApiError::Rejected(message)) => {
                warn!(session = %self.session_id, reason = %message, "Sale rejected by backend");
                self.dialogs.notify(Notification::error(message.clone()));
                FinalizeOutcome::Failed(message)
            }
            Err(e) => {
                error!(session = %self.session_id, error = %e, "Sale submission failed");
                self.dialogs
                    .notify(Notification::error(MSG_CONNECTION_ERROR));
                FinalizeOutcome::Failed(MSG_CONNECTION_ERROR.to_string())
            }
        }
    }

    /// Close the confirmation summary shown after a successful sale.
    pub fn dismiss_receipt(&mut self) {
        self.receipt = None;
    }

    // -----------------------------------------------------------------------
    // View
    // -----------------------------------------------------------------------

    fn search_panel(&self) -> Option<SearchPanel> {
        if !self.results_visible {
            return None;
        }
        let results = self.catalog.search(&self.search_term);
        if results.is_suppressed() {
            return None;
        }
        Some(SearchPanel {
            term: self.search_term.trim().to_string(),
            entries: results
                .iter()
                .map(|p| SearchEntryView {
                    id: p.id,
                    name: p.name.clone(),
                    price: format_brl(p.price),
                    stock: p.stock,
                })
                .collect(),
        })
    }

    pub fn view(&self) -> CartView {
        CartView {
            search_term: self.search_term.clone(),
            results: self.search_panel(),
            selected: self.active.as_ref().map(|p| p.name.clone()),
            quantity_input: self.quantity_input.clone(),
            subtotal: self.pending_subtotal(),
            add_enabled: self.add_enabled(),
            just_added: self.just_added,
            lines: self
                .cart
                .lines()
                .iter()
                .enumerate()
                .map(|(index, line)| LineView {
                    index,
                    product_id: line.product.id,
                    name: line.product.name.clone(),
                    quantity: line.quantity(),
                    unit_price: format_brl(line.product.price),
                    subtotal: format_brl(line.subtotal()),
                })
                .collect(),
            total: format_brl(self.cart.total()),
            submit: self.submit,
            receipt: self.receipt.as_ref().map(ReceiptView::from),
        }
    }
}
