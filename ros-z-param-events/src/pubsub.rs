use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use std::{marker::PhantomData, sync::Arc};

use tracing::{debug, info, trace, warn};
use zenoh::liveliness::LivelinessToken;
use zenoh::{Result, Session, Wait, sample::Sample};

use crate::Builder;
use crate::attachment::{Attachment, GidArray};
use crate::common::DataHandler;
use crate::entity::EndpointEntity;
use crate::msg::{CdrSerdes, MessageTypeInfo, SerdesError, ZDeserializer, ZSerializer};
use crate::names;
use crate::qos::{QosDurability, QosProfile, QosReliability};
use crate::queue::BoundedQueue;

/// Qualify the endpoint topic against its node and fill in the type info.
fn prepare_entity<T: MessageTypeInfo>(entity: &mut EndpointEntity) -> Result<()> {
    let qualified_topic =
        names::qualify_topic_name(&entity.topic, &entity.node.namespace, &entity.node.name)
            .map_err(|e| zenoh::Error::from(format!("Failed to qualify topic: {}", e)))?;
    entity.topic = qualified_topic;
    if entity.type_info.is_none() {
        entity.type_info = Some(T::type_info());
    }
    Ok(())
}

pub struct ZPub<T, S> {
    pub entity: EndpointEntity,
    sn: AtomicUsize,
    gid: GidArray,
    inner: zenoh::pubsub::Publisher<'static>,
    _lv_token: LivelinessToken,
    _phantom_data: PhantomData<(T, S)>,
}

pub struct ZPubBuilder<T, S = CdrSerdes<T>> {
    pub entity: EndpointEntity,
    pub session: Arc<Session>,
    pub _phantom_data: PhantomData<(T, S)>,
}

impl<T, S> ZPubBuilder<T, S> {
    pub fn with_qos(mut self, qos: QosProfile) -> Self {
        self.entity.qos = qos;
        self
    }
}

impl<T, S> Builder for ZPubBuilder<T, S>
where
    T: MessageTypeInfo + 'static,
    S: for<'a> ZSerializer<Input<'a> = &'a T> + 'static,
{
    type Output = ZPub<T, S>;

    #[tracing::instrument(name = "pub_build", skip(self), fields(
        topic = %self.entity.topic,
        qos = %self.entity.qos
    ))]
    fn build(mut self) -> Result<Self::Output> {
        prepare_entity::<T>(&mut self.entity)?;
        debug!("[PUB] Qualified topic: {}", self.entity.topic);

        let key_expr = self.entity.topic_key_expr()?;
        debug!("[PUB] Key expression: {}", key_expr);

        let mut pub_builder = self.session.declare_publisher(key_expr);

        // Reliable blocks under congestion, BestEffort drops
        pub_builder = match self.entity.qos.reliability {
            QosReliability::Reliable => {
                pub_builder.congestion_control(zenoh::qos::CongestionControl::Block)
            }
            QosReliability::BestEffort => {
                pub_builder.congestion_control(zenoh::qos::CongestionControl::Drop)
            }
        };
        pub_builder = match self.entity.qos.durability {
            QosDurability::TransientLocal => pub_builder.express(true),
            QosDurability::Volatile => pub_builder.express(false),
        };

        let inner = pub_builder.wait()?;
        let lv_token = self
            .session
            .liveliness()
            .declare_token(self.entity.lv_token_key_expr()?)
            .wait()?;
        let gid = self.entity.gid();
        info!("[PUB] Publisher ready: topic={}", self.entity.topic);

        Ok(ZPub {
            entity: self.entity,
            sn: AtomicUsize::new(0),
            gid,
            inner,
            _lv_token: lv_token,
            _phantom_data: PhantomData,
        })
    }
}

impl<T, S> ZPub<T, S>
where
    T: 'static,
    S: for<'a> ZSerializer<Input<'a> = &'a T> + 'static,
{
    fn new_attachment(&self) -> Attachment {
        let sn = self.sn.fetch_add(1, Ordering::Relaxed);
        trace!("[PUB] Creating attachment: sn={}", sn);
        Attachment::new(sn as _, self.gid)
    }

    #[tracing::instrument(name = "publish", skip(self, msg), fields(
        topic = %self.entity.topic,
        payload_len = tracing::field::Empty
    ))]
    pub fn publish(&self, msg: &T) -> Result<()> {
        let payload = S::serialize(msg)?;
        tracing::Span::current().record("payload_len", payload.len());
        debug!("[PUB] Publishing message");

        self.inner
            .put(payload)
            .attachment(self.new_attachment())
            .wait()
    }
}

pub struct ZSubBuilder<T, S = CdrSerdes<T>> {
    pub entity: EndpointEntity,
    pub session: Arc<Session>,
    pub _phantom_data: PhantomData<(T, S)>,
}

impl<T, S> ZSubBuilder<T, S>
where
    T: MessageTypeInfo,
{
    pub fn with_qos(mut self, qos: QosProfile) -> Self {
        self.entity.qos = qos;
        self
    }

    fn build_internal<Q>(
        mut self,
        handler: DataHandler<Sample>,
        queue: Option<Arc<BoundedQueue<Q>>>,
    ) -> Result<ZSub<T, Q, S>> {
        prepare_entity::<T>(&mut self.entity)?;
        debug!("[SUB] Qualified topic: {}", self.entity.topic);

        let key_expr = self.entity.topic_key_expr()?;
        debug!("[SUB] Key expression: {}, qos={}", key_expr, self.entity.qos);
        if self.entity.qos.durability == QosDurability::TransientLocal {
            debug!("[SUB] TransientLocal requested, samples published before the subscription are not replayed");
        }

        let inner = self
            .session
            .declare_subscriber(key_expr)
            .callback(move |sample| handler.handle(sample))
            .wait()?;

        let lv_token = self
            .session
            .liveliness()
            .declare_token(self.entity.lv_token_key_expr()?)
            .wait()?;

        info!("[SUB] Subscriber ready: topic={}", self.entity.topic);

        Ok(ZSub {
            entity: self.entity,
            queue,
            _inner: inner,
            _lv_token: lv_token,
            _phantom_data: PhantomData,
        })
    }

    /// Build a subscriber invoking `callback` with each deserialized message
    /// on the Zenoh delivery thread. Undecodable samples are logged and dropped.
    pub fn build_with_callback<F>(self, callback: F) -> Result<ZSub<T, (), S>>
    where
        F: Fn(S::Output) + Send + Sync + 'static,
        S: for<'a> ZDeserializer<Input<'a> = &'a [u8]> + 'static,
    {
        let topic = self.entity.topic.clone();
        let callback = Arc::new(move |sample: Sample| {
            let payload = sample.payload().to_bytes();
            if let Some(att) = sample.attachment() {
                match Attachment::try_from(att) {
                    Ok(att) => trace!("[SUB] Received sn={} on {}", att.sequence_number, topic),
                    Err(e) => trace!("[SUB] Unreadable attachment on {}: {}", topic, e),
                }
            }
            match S::deserialize(&payload[..]) {
                Ok(msg) => callback(msg),
                Err(e) => warn!("[SUB] Failed to deserialize message on {}: {}", topic, e),
            }
        });

        self.build_internal(DataHandler::Callback(callback), None)
    }
}

impl<T, S> Builder for ZSubBuilder<T, S>
where
    T: MessageTypeInfo,
{
    type Output = ZSub<T, Sample, S>;

    /// Build a subscriber buffering up to the QoS history depth samples.
    fn build(self) -> Result<Self::Output> {
        let queue = Arc::new(BoundedQueue::new(self.entity.qos.history.depth()));
        self.build_internal(DataHandler::Queue(queue.clone()), Some(queue))
    }
}

pub struct ZSub<T, Q, S> {
    pub entity: EndpointEntity,
    pub queue: Option<Arc<BoundedQueue<Q>>>,
    _inner: zenoh::pubsub::Subscriber<()>,
    _lv_token: LivelinessToken,
    _phantom_data: PhantomData<(T, S)>,
}

impl<T, S> ZSub<T, Sample, S>
where
    S: for<'a> ZDeserializer<Input<'a> = &'a [u8]>,
{
    fn decode(sample: Sample) -> std::result::Result<S::Output, SerdesError> {
        let payload = sample.payload().to_bytes();
        S::deserialize(&payload[..])
    }

    /// Receive and deserialize the next buffered message, waiting at most `timeout`.
    ///
    /// `None` if nothing arrived in time or the subscriber was built with a
    /// callback. A buffered sample that fails to decode is consumed and
    /// returned as the error.
    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> Option<std::result::Result<S::Output, SerdesError>> {
        let sample = self.queue.as_ref()?.recv_timeout(timeout)?;
        Some(Self::decode(sample))
    }

    /// Receive and deserialize a buffered message without blocking.
    pub fn try_recv(&self) -> Option<std::result::Result<S::Output, SerdesError>> {
        let sample = self.queue.as_ref()?.try_recv()?;
        Some(Self::decode(sample))
    }
}
